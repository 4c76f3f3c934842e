//! Basic usage example for the arxiv-fetch library.
//!
//! Two tasks share one client: one searches the query API, the other reads today's
//! cs.LG announcements. Both go through the same rate limiter and HTTP session.

use arxiv_fetch::{Client, ClientConfig, FeedQuery, SearchQuery, SortCriterion};
use futures_util::TryStreamExt;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("arxiv_fetch=info")
        .init();

    let client = Arc::new(Client::with_config(ClientConfig::default().page_size(5)));
    println!("{}\n", client);

    client.open().await?;

    let search = {
        let client = Arc::clone(&client);
        tokio::spawn(async move {
            let query = SearchQuery::new("cat:cs.LG AND ti:transformer")
                .max_results(12)
                .sort_by(SortCriterion::SubmittedDate);
            client.results(&query, 0).try_collect::<Vec<_>>().await
        })
    };

    let feed = {
        let client = Arc::clone(&client);
        tokio::spawn(async move {
            let query = FeedQuery::new("cs.LG").max_results(5);
            client.feed_results(&query, 0).try_collect::<Vec<_>>().await
        })
    };

    let (papers, announcements) = (search.await?, feed.await?);
    client.close().await?;

    let papers = papers?;
    println!("Search returned {} papers", papers.len());
    for (i, paper) in papers.iter().take(3).enumerate() {
        println!("\n{}. {}", i + 1, paper.title);
        let authors: Vec<&str> = paper.authors.iter().map(|a| a.name.as_str()).collect();
        println!("   Authors: {}", authors.join(", "));
        if let Some(published) = paper.published {
            println!("   Published: {}", published.date_naive());
        }
        if let Some(pdf_url) = paper.pdf_url() {
            println!("   PDF: {}", pdf_url);
        }
    }

    println!("\nLatest cs.LG announcements:");
    for entry in announcements? {
        println!("  {}", entry);
    }

    Ok(())
}
