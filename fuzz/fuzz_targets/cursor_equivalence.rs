#![no_main]

use avl_arena::model::{run_cursor_equivalence, CursorEquivalenceInput};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: CursorEquivalenceInput| { run_cursor_equivalence(input.keys, input.ops) });
