use stress_test::{long_query_shape, short_query_shape, stress_scaling, stress_subscribe_churn};
pub mod stress_test;

fn main() {
    let repeat: usize = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(3);

    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async_main(repeat));
}

async fn async_main(repeat: usize) {
    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║            CACHE LEAK PROBE                                 ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    // Probe 1: deep query churn - the full chat graph every cycle
    let stats = stress_subscribe_churn(repeat, long_query_shape()).await;
    stats.print();
    assert_eq!(stats.leaked_records, 0, "deep query churn leaked records");

    // Probe 2: shallow query churn - root and chat records only
    let stats = stress_subscribe_churn(repeat, short_query_shape()).await;
    stats.print();
    assert_eq!(stats.leaked_records, 0, "shallow query churn leaked records");

    // Probe 3: scaling analysis
    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║          SCALING ANALYSIS (deep query)                     ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    stress_scaling(20, 5).await;

    println!("\n✓ All leak probes completed, nothing retained!");
}
