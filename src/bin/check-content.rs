use anyhow::Context;
use clap::Parser;
use joecowin::Site;
use joecowin::models::PageId;
use std::path::PathBuf;

// cargo run --bin check-content -- content/site.yaml

#[derive(Debug, Parser)]
#[command(name = "check-content", version, about = "Validate a site content YAML file")]
struct Args {
    /// Content file to check (eg: "content/site.yaml")
    path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let site = Site::load(&args.path).with_context(|| format!("checking {}", args.path.display()))?;

    println!("✓ {} is valid", args.path.display());
    println!("  host:      {}", site.host);
    println!(
        "  interests: {} ({})",
        site.interests.join(", "),
        if site.shuffle { "shuffled" } else { "fixed order" }
    );
    for id in PageId::TABS {
        let Some(page) = site.page(id) else { continue };
        let chars: usize = page.blocks.iter().map(|b| b.char_len()).sum();
        let cycler = if page.cycle_anchor().is_some() { ", cycling word" } else { "" };
        println!(
            "  {:<10} {} blocks, {} chars{}",
            id.path(),
            page.blocks.len(),
            chars,
            cycler
        );
    }

    Ok(())
}
