use std::io::Write;

use anyhow::Context;
use avl_arena::AvlTree;
use clap::Parser;
use log::info;

/// Builds an AVL tree from the command line and prints it.
///
/// Keys are inserted first, in the order given, then removed. Each key's value is the position
/// at which it was inserted.
#[derive(Parser, Debug)]
#[command(name = "avl-demo")]
struct Opts {
    /// Keys to insert
    #[arg(long = "insert", num_args = 1.., allow_negative_numbers = true)]
    insert: Vec<i64>,
    /// Keys to remove after all insertions
    #[arg(long = "remove", num_args = 1.., allow_negative_numbers = true)]
    remove: Vec<i64>,
    /// Print the final tree in Graphviz DOT format instead of listing its entries
    #[arg(long = "dot")]
    dot: bool,
    /// Graph name used with `--dot`
    #[arg(long = "name", default_value = "avl")]
    name: String,
    /// Validate the tree after every operation
    #[arg(long = "check", env = "AVL_DEMO_CHECK")]
    check: bool,
}

fn initialize_logger() {
    use env_logger::{Builder, Env};

    // The log level comes from `RUST_LOG`, "info" if unset.
    let env = Env::default().default_filter_or("info");

    let mut builder = Builder::from_env(env);

    builder.format(|buf, record| {
        let path = record.module_path().unwrap_or("");
        writeln!(buf, "[{} {path}] {}", record.level(), record.args())
    });

    builder.init();
}

fn check(tree: &AvlTree<i64, usize>, after: &str) -> anyhow::Result<()> {
    tree.validate()
        .with_context(|| format!("tree is invalid after {after}"))
}

fn main() -> anyhow::Result<()> {
    initialize_logger();
    let opts = Opts::parse();

    let mut tree = AvlTree::new();

    for (pos, &key) in opts.insert.iter().enumerate() {
        let id = tree.insert(key, pos);
        info!("insert {key} -> {id}");

        if opts.check {
            check(&tree, &format!("inserting {key}"))?;
        }
    }

    for key in &opts.remove {
        let removed = tree.remove(key);
        info!("remove {key}: {}", if removed { "removed" } else { "absent" });

        if opts.check {
            check(&tree, &format!("removing {key}"))?;
        }
    }

    if opts.dot {
        let mut out = String::new();
        tree.dotgraph(&opts.name, &mut out)
            .context("failed to render the tree")?;
        println!("{out}");
    } else {
        info!(
            "{} entries, height {}",
            tree.len(),
            tree.height().map_or_else(|| "-".to_string(), |h| h.to_string())
        );
        for (key, pos) in &tree {
            println!("{key}\t{pos}");
        }
    }

    Ok(())
}
