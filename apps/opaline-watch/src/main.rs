//! # Opaline Watch
//!
//! A standalone CLI demo of the Opaline normalized live cache. Watches a
//! chat query served by a scripted in-memory backend, shows how results
//! re-deliver as entities change, dumps the normalized store, and proves
//! that unsubscribe + gc reclaims everything.

use clap::{Parser, Subcommand};
use colored::*;
use nlc_sdk::prelude::*;
use nlc_sdk::{MemoryFetcher, QueryEvent};
use std::sync::Arc;

// ─── CLI ───────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "opaline-watch")]
#[command(about = "Live-query cache explorer (Opaline SDK)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Basic demo: subscribe, watch a live update arrive, inspect the store
    Demo,
    /// Eviction demo: evict a shared entity and watch the hole appear
    Evict,
    /// Collection demo: churn subscriptions and prove nothing leaks
    Collect {
        /// Number of subscribe/unsubscribe cycles
        #[arg(short, long, default_value_t = 5)]
        cycles: usize,
    },
}

// ─── Scripted backend ──────────────────────────────────────────────────────

fn chat_shape() -> QueryShape {
    QueryShape::new().object(
        "chat",
        QueryShape::new()
            .field("id")
            .field("name")
            .object(
                "messages",
                QueryShape::new()
                    .field("id")
                    .field("text")
                    .object("author", QueryShape::new().field("id").field("name")),
            ),
    )
}

fn chat_result(chat_id: &str, author_name: &str) -> RawObject {
    let message = |m: usize, text: &str| {
        RawValue::Object(
            RawObject::typed("Message")
                .with_scalar("id", format!("{}-m{}", chat_id, m))
                .with_scalar("text", text)
                .with_field(
                    "author",
                    RawValue::Object(
                        RawObject::typed("User")
                            .with_scalar("id", "u-alice")
                            .with_scalar("name", author_name),
                    ),
                ),
        )
    };

    RawObject::untyped().with_field(
        "chat",
        RawValue::Object(
            RawObject::typed("Chat")
                .with_scalar("id", chat_id)
                .with_scalar("name", "general")
                .with_field(
                    "messages",
                    RawValue::List(vec![
                        message(0, "hello there"),
                        message(1, "anyone around?"),
                    ]),
                ),
        ),
    )
}

fn args_for(chat_id: &str) -> Arguments {
    Arguments::none().with("id", chat_id)
}

fn print_delivery(label: &str, event: QueryEvent) {
    match event {
        QueryEvent::Next(result) => {
            println!("{} {}", label.green().bold(), "delivery:".bold());
            println!(
                "{}",
                serde_json::to_string_pretty(&result.to_json()).unwrap_or_default()
            );
        }
        QueryEvent::Error(error) => {
            println!("{} {}", label.red().bold(), error);
        }
    }
}

fn print_store(cache: &Cache<MemoryFetcher>) {
    println!("\n{}", "normalized store:".bold());
    for key in cache.store_keys() {
        let fields = cache
            .get_record(&key)
            .map(|record| record.len())
            .unwrap_or(0);
        println!("  {} ({} fields)", key.to_string().cyan(), fields);
    }
    println!("  {} live records\n", cache.store_len());
}

// ─── Subcommands ───────────────────────────────────────────────────────────

async fn demo() {
    println!("{}", "── live update demo ──".bold());

    let fetcher = Arc::new(MemoryFetcher::new());
    fetcher.respond_with(&args_for("c-1"), chat_result("c-1", "Alice"));
    let cache = Cache::new(fetcher.clone(), CacheConfig::default());

    let (observer, mut events) = ChannelObserver::channel();
    let handle = cache
        .subscribe(chat_shape(), args_for("c-1"), observer)
        .expect("demo shape is valid");

    print_delivery("first", events.recv().await.expect("first delivery"));
    print_store(&cache);

    // The refetched result renames the author; the store merge re-delivers
    // the updated view.
    println!("{}", "renaming the author via a refetch...".yellow());
    fetcher.respond_with(&args_for("c-1"), chat_result("c-1", "Alice Liddell"));
    cache.refetch(&handle).expect("handle is live");
    print_delivery("update", events.recv().await.expect("update delivery"));

    cache.unsubscribe(&handle);
    cache.gc();
    println!(
        "{} {} records after unsubscribe + gc",
        "done:".green().bold(),
        cache.store_len()
    );
}

async fn evict_demo() {
    println!("{}", "── eviction demo ──".bold());

    let fetcher = Arc::new(MemoryFetcher::new());
    fetcher.respond_with(&args_for("c-1"), chat_result("c-1", "Alice"));
    let cache = Cache::new(fetcher, CacheConfig::default());

    let (observer, mut events) = ChannelObserver::channel();
    let handle = cache
        .subscribe(chat_shape(), args_for("c-1"), observer)
        .expect("demo shape is valid");
    print_delivery("first", events.recv().await.expect("first delivery"));

    let author = EntityKey::entity("User", &nlc_sdk::ScalarValue::Str("u-alice".into()));
    println!("{} {}", "evicting".yellow(), author.to_string().cyan());
    cache.evict(&author);

    print_delivery("after evict", events.recv().await.expect("evict delivery"));
    println!(
        "{}",
        "the author position reads as null; siblings are untouched".italic()
    );

    cache.unsubscribe(&handle);
    cache.gc();
    print_store(&cache);
}

async fn collect_demo(cycles: usize) {
    println!("{}", "── collection demo ──".bold());

    let fetcher = Arc::new(MemoryFetcher::new());
    let cache = Cache::new(fetcher.clone(), CacheConfig::default());

    for cycle in 0..cycles {
        let chat_id = format!("chat-{}", cycle);
        fetcher.respond_with(&args_for(&chat_id), chat_result(&chat_id, "Alice"));

        let (observer, mut events) = ChannelObserver::channel();
        let handle = cache
            .subscribe(chat_shape(), args_for(&chat_id), observer)
            .expect("demo shape is valid");
        events.recv().await.expect("first delivery");

        let peak = cache.store_len();
        cache.unsubscribe(&handle);
        let swept = cache.gc();

        let verdict = if cache.store_len() == 0 {
            "clean".green()
        } else {
            "LEAKED".red().bold()
        };
        println!(
            "  cycle {}: peak {} records, swept {}, {}",
            cycle,
            peak,
            swept.removed_count(),
            verdict
        );
    }

    cache.evict(&EntityKey::root_query());
    cache.gc();
    cache.reset();
    println!(
        "\n{} {} records retained after evict(root) + gc + reset",
        "final:".green().bold(),
        cache.store_len()
    );
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Demo => demo().await,
        Commands::Evict => evict_demo().await,
        Commands::Collect { cycles } => collect_demo(cycles).await,
    }
}
