use async_stream::stream;
use async_trait::async_trait;
use chrono::Local;
use futures::stream::Stream;
use futures::stream::StreamExt;
use nlc_sdk::prelude::*;
use nlc_sdk::{CacheConfigBuilder, QueryEvent};
use rand::{thread_rng, Rng};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Statistics collected during a subscribe/unsubscribe churn run
#[derive(Clone, Debug)]
pub struct LeakProbeStats {
    pub cycles: usize,
    pub peak_live_records: usize,
    pub leaked_records: usize,
    pub total_deliveries: usize,
    pub total_time: Duration,
    pub cycles_per_second: f64,
}

impl LeakProbeStats {
    pub fn print(&self) {
        println!("\n╔════════════════════════════════════════════════════════════╗");
        println!("║              Leak Probe Statistics                          ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║  Cycles:                    {:>38} ║", self.cycles);
        println!("║  Peak Live Records:         {:>38} ║", self.peak_live_records);
        println!("║  Leaked Records (final):    {:>38} ║", self.leaked_records);
        println!("║  Total Deliveries:          {:>38} ║", self.total_deliveries);
        println!("║  Total Time:                {:>39}s ║", format!("{:.3}", self.total_time.as_secs_f64()));
        println!("║  Cycles/Second:             {:>38.1} ║", self.cycles_per_second);
        println!("╚════════════════════════════════════════════════════════════╝");
    }
}

/// Random hex-suffixed id, one per synthetic entity
fn uuid(label: &str) -> String {
    format!("{}-{:x}", label, thread_rng().gen::<u64>())
}

/// Synthetic resolver standing in for a real backend: every fetch invents
/// a fresh graph of messages, authors, reactions and viewers for the
/// requested chat id.
pub struct ChatFetcher {
    pub messages_per_chat: usize,
    pub reactions_per_message: usize,
    pub viewers_per_message: usize,
}

impl ChatFetcher {
    pub fn new() -> Self {
        Self {
            messages_per_chat: 10,
            reactions_per_message: 10,
            viewers_per_message: 10,
        }
    }

    pub fn with_fanout(messages: usize, reactions: usize, viewers: usize) -> Self {
        Self {
            messages_per_chat: messages,
            reactions_per_message: reactions,
            viewers_per_message: viewers,
        }
    }

    fn user(&self) -> RawValue {
        RawValue::Object(
            RawObject::typed("User")
                .with_scalar("id", uuid("User"))
                .with_scalar("name", uuid("User.name")),
        )
    }

    fn reaction(&self) -> RawValue {
        RawValue::Object(
            RawObject::typed("Reaction")
                .with_scalar("id", uuid("Reaction"))
                .with_scalar("kind", uuid("Reaction.kind"))
                .with_field("author", self.user()),
        )
    }

    fn message(&self) -> RawValue {
        let reactions: Vec<RawValue> =
            (0..self.reactions_per_message).map(|_| self.reaction()).collect();
        let viewers: Vec<RawValue> =
            (0..self.viewers_per_message).map(|_| self.user()).collect();
        RawValue::Object(
            RawObject::typed("Message")
                .with_scalar("id", uuid("Message"))
                .with_field("author", self.user())
                .with_field("reactions", RawValue::List(reactions))
                .with_field("viewed_by", RawValue::List(viewers)),
        )
    }
}

impl Default for ChatFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryFetcher for ChatFetcher {
    async fn fetch(
        &self,
        _shape: &QueryShape,
        args: &Arguments,
    ) -> Result<RawObject, FetchError> {
        let chat_id = match args.get("id") {
            Some(id) => id.id_text(),
            None => return Err(FetchError::Failed("missing chat id".to_string())),
        };

        let messages: Vec<RawValue> =
            (0..self.messages_per_chat).map(|_| self.message()).collect();
        let members: Vec<RawValue> =
            (0..self.messages_per_chat).map(|_| self.user()).collect();

        Ok(RawObject::untyped().with_field(
            "chat",
            RawValue::Object(
                RawObject::typed("Chat")
                    .with_scalar("id", chat_id.clone())
                    .with_scalar("name", chat_id)
                    .with_field("messages", RawValue::List(messages))
                    .with_field("members", RawValue::List(members)),
            ),
        ))
    }
}

fn user_shape() -> QueryShape {
    QueryShape::new().field("id").field("name")
}

/// The deep query: chat with messages, authors, reactions and viewers
pub fn long_query_shape() -> QueryShape {
    let reaction = QueryShape::new()
        .field("id")
        .field("kind")
        .object("author", user_shape());
    let message = QueryShape::new()
        .field("id")
        .object("author", user_shape())
        .object("reactions", reaction)
        .object("viewed_by", user_shape());

    QueryShape::new().object(
        "chat",
        QueryShape::new()
            .field("id")
            .field("name")
            .object("messages", message)
            .object("members", user_shape()),
    )
}

/// The shallow query: chat id and name only
pub fn short_query_shape() -> QueryShape {
    QueryShape::new().object("chat", QueryShape::new().field("id").field("name"))
}

/// Generator that yields (cycle, chat id) pairs for the churn loop
fn churn_cycles(count: usize) -> impl Stream<Item = (usize, String)> {
    stream! {
        for cycle in 0..count {
            yield (cycle, format!("one-{}", cycle));
        }
    }
}

fn heap_checkpoint(label: &str) {
    println!(
        "  [{}] ── heap checkpoint: {} ──",
        Local::now().format("%H:%M:%S%.3f"),
        label
    );
}

/// Churn: subscribe, take the first delivery, unsubscribe, sweep - the
/// store must come back empty every cycle or the cache is leaking.
pub async fn stress_subscribe_churn(cycles: usize, shape: QueryShape) -> LeakProbeStats {
    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║        Subscribe/Unsubscribe Churn                         ║");
    println!("║  Cycles: {:<3}                                               ║", cycles);
    println!("╚════════════════════════════════════════════════════════════╝");

    let cache = Cache::new(
        Arc::new(ChatFetcher::new()),
        CacheConfigBuilder::new().label("leak-probe").build(),
    );

    let start = Instant::now();
    let mut peak_live_records = 0;
    let mut total_deliveries = 0;

    println!("\n[Phase 1/2] Churning subscriptions...");

    let mut cycle_gen = Box::pin(churn_cycles(cycles));
    while let Some((cycle, chat_id)) = cycle_gen.next().await {
        let (observer, mut events) = ChannelObserver::channel();
        let args = Arguments::none().with("id", chat_id);
        let handle = cache
            .subscribe(shape.clone(), args, observer)
            .expect("churn shape is valid");

        match events.recv().await {
            Some(QueryEvent::Next(_)) => total_deliveries += 1,
            Some(QueryEvent::Error(error)) => panic!("fetch failed: {}", error),
            None => panic!("delivery channel closed early"),
        }

        peak_live_records = peak_live_records.max(cache.store_len());
        cache.unsubscribe(&handle);
        cache.gc();

        heap_checkpoint(&format!(
            "cycle {} done, {} live records",
            cycle,
            cache.store_len()
        ));
    }

    println!("[Phase 1/2] ✓ Completed");
    println!("[Phase 2/2] Evicting root, sweeping, resetting...");

    cache.evict(&EntityKey::root_query());
    cache.gc();
    cache.reset();
    heap_checkpoint(&format!("final, {} live records", cache.store_len()));

    let leaked_records = cache.store_len();
    let total_time = start.elapsed();

    println!("[Phase 2/2] ✓ Completed");

    LeakProbeStats {
        cycles,
        peak_live_records,
        leaked_records,
        total_deliveries,
        total_time,
        cycles_per_second: cycles as f64 / total_time.as_secs_f64().max(f64::EPSILON),
    }
}

/// Scaling analysis: one churn cycle at growing graph fanouts
pub async fn stress_scaling(max_messages: usize, step: usize) {
    println!("\n  {:>10} {:>14} {:>14}", "messages", "peak records", "cycle time");

    let mut messages = step.max(1);
    while messages <= max_messages {
        let cache = Cache::new(
            Arc::new(ChatFetcher::with_fanout(messages, 3, 3)),
            CacheConfigBuilder::new().label("scaling").build(),
        );

        let start = Instant::now();
        let (observer, mut events) = ChannelObserver::channel();
        let handle = cache
            .subscribe(
                long_query_shape(),
                Arguments::none().with("id", format!("scale-{}", messages)),
                observer,
            )
            .expect("scaling shape is valid");
        let _ = events.recv().await;

        let peak = cache.store_len();
        cache.unsubscribe(&handle);
        cache.gc();
        let elapsed = start.elapsed();

        assert_eq!(cache.store_len(), 0, "scaling run leaked records");
        println!(
            "  {:>10} {:>14} {:>13.2}ms",
            messages,
            peak,
            elapsed.as_secs_f64() * 1000.0
        );

        messages += step;
    }
}
