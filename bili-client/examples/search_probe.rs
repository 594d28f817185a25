use bili_client::{BiliApiClient, Crawler, VideoSource};
use insight_core::CrawlSettings;
use std::io::{self, Write};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("=== Bilibili Search Probe ===\n");
    println!("Hits the live API: one search page, one video, one comment document.\n");

    print!("Enter search keyword [大模型]: ");
    io::stdout().flush()?;
    let mut keyword = String::new();
    io::stdin().read_line(&mut keyword)?;
    let keyword = match keyword.trim() {
        "" => "大模型".to_string(),
        other => other.to_string(),
    };

    let settings = CrawlSettings::default();
    let client = BiliApiClient::new(&settings)?;
    println!("✅ Client created (UA: {})\n", client.user_agent());

    println!("🔄 Warming up session...");
    client.warm_up().await;

    println!("🔍 Searching page 1 for {}...", keyword);
    let results = match client.search_page(&keyword, 1, settings.page_size).await {
        Ok(results) => results,
        Err(e) => {
            println!("❌ Search failed: {}", e);
            return Ok(());
        }
    };
    println!("✅ Found {} videos:", results.len());
    for (i, video) in results.iter().take(5).enumerate() {
        println!(
            "   {}. {} [{}] views={} comments={}",
            i + 1,
            video.title,
            video.video_id,
            video.view_count,
            video.comment_count
        );
    }
    println!();

    let Some(first) = results.first() else {
        println!("⚠️  No videos to probe further");
        return Ok(());
    };

    let crawler = Crawler::new(client, &settings);
    println!("🎬 Resolving stream id for {}...", first.video_id);
    let Some(stream_id) = crawler.resolve_stream_id(&first.video_id).await else {
        println!("❌ No stream id");
        return Ok(());
    };
    println!("✅ Stream id: {}\n", stream_id);

    println!("💬 Fetching comments...");
    let comments = crawler.fetch_comments(stream_id).await;
    println!("✅ Got {} comments:", comments.len());
    for comment in comments.iter().take(10) {
        println!("   - {}", comment);
    }

    println!("\n🎉 Probe completed");
    Ok(())
}
