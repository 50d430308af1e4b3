use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use pulse::config::Config;
use pulse::models::{MemberContext, Post};
use pulse::pipeline::InsightsPipeline;
use pulse::store::{MemoryMemberDirectory, MemoryPostStore};

pub async fn analyze(
    input: String,
    members: Option<String>,
    no_enrichment: bool,
    output: Option<String>,
    pretty: bool,
) -> Result<()> {
    let posts = load_posts(Path::new(&input))?;
    println!("Loaded {} posts from {input}", posts.len());

    let member_context = match &members {
        Some(path) => load_members(Path::new(path))?,
        None => MemberContext::new(),
    };

    let config = Config::from_env().context("Failed to load configuration from environment")?;
    if !no_enrichment {
        config
            .validate()
            .context("Invalid provider configuration; pass --no-enrichment to skip the LLM")?;
    }

    let pipeline = InsightsPipeline::new(
        Arc::new(MemoryPostStore::default()),
        Arc::new(MemoryMemberDirectory::default()),
        config.provider,
    );
    let result = pipeline
        .generate_insights_for_posts(&posts, &member_context, !no_enrichment)
        .await;

    println!(
        "Generated {} topics, {} nodes, {} edges",
        result.topics.len(),
        result.nodes.len(),
        result.edges.len()
    );

    let rendered = if pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };

    match output {
        Some(path) => {
            std::fs::write(&path, rendered)
                .with_context(|| format!("Failed to write results to {path}"))?;
            println!("Results written to {path}");
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

fn load_posts(path: &Path) -> Result<Vec<Post>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read posts file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse posts file {}", path.display()))
}

fn load_members(path: &Path) -> Result<MemberContext> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read members file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse members file {}", path.display()))
}
