use anyhow::{Context, Result};
use spending_analytics::*;

const RECEIPTS: &str = "\
merchant_name,item_name,amount_text,date,category
星巴克,Latte,￥38.00,2025年09月03日,
Taxi 沪A-0001,Taxi fare,56元,2025/09/15,
Landlord,September rent,￥3200.00,2025-09-01,Housing
星巴克,Latte,￥41.50,2025-10-02,
Railway,G102 Shanghai-Beijing,￥553.00,2025.10.20,
Landlord,October rent,￥3200.00,2025-10-01,Housing
Stationer,A4 paper,￥89.90,2025-10-21,
星巴克,Latte,￥36.00,2025-11-04,
Landlord,November rent,￥3200.00,2025-11-01,Housing
China Mobile,Monthly plan,￥128.00,2025-11-12,
星巴克,Latte,￥39.00,2025-12-05,
Landlord,December rent,￥3200.00,2025-12-01,Housing
Mall,Gift card,￥2400.00,2025-12-24,
";

fn main() -> Result<()> {
    let user = UserContext::new(1, "Demo User");
    let mut analyzer = SpendingAnalyzer::new(InMemoryStore::new());

    let mut reader = csv::Reader::from_reader(RECEIPTS.as_bytes());
    for (line, row) in reader.deserialize::<ExtractedDocument>().enumerate() {
        let document = row.with_context(|| format!("Malformed receipt row {}", line + 1))?;
        let merchant = document.merchant_name.clone().unwrap_or_default();
        let txn = document
            .into_transaction(user.user_id)
            .with_context(|| format!("Could not read receipt from '{}'", merchant))?;

        let stored = analyzer.record_transaction(&user, txn)?;
        println!(
            "#{:<3} {} {:<16} {:<16} {:>10.2}{}",
            stored.id,
            stored.transaction.date,
            stored.transaction.category,
            stored.transaction.merchant,
            stored.transaction.amount,
            if stored.is_anomaly { "  <- unusual" } else { "" }
        );
    }

    let trend = analyzer.trend_report(&user);
    println!("\nMonthly spend:");
    for (month, amount) in trend.months.iter().zip(&trend.amounts) {
        println!("  {}  {:>10.2}", month, amount);
    }
    println!("  next     {:>10.2} (forecast)", trend.prediction);

    match analyzer.cluster_spending(&user)? {
        Some(report) => {
            println!("\nSpending habits ({} transactions):", report.total_points);
            for cluster in &report.clusters {
                println!(
                    "  cluster {}: {} transactions, around day {:.0}, about {:.2}",
                    cluster.cluster_id + 1,
                    cluster.count,
                    cluster.avg_day,
                    cluster.avg_amount
                );
            }
        }
        None => println!("\nNot enough transactions to find spending habits yet."),
    }

    if let Some(profiles) = analyzer.cluster_profiles(&user)? {
        println!("\nCentroids for the narrative service:");
        println!("{}", serde_json::to_string_pretty(&profiles)?);
    }

    let graph = analyzer.knowledge_graph(&user);
    println!("\nRelationship graph:");
    println!("{}", serde_json::to_string_pretty(&graph)?);

    Ok(())
}
