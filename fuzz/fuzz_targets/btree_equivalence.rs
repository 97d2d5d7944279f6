#![no_main]

use avl_arena::model::{run_btree_equivalence, Op};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|ops: Vec<Op>| { run_btree_equivalence(ops) });
