use anyhow::{bail, Result};
use bridge_traits::catalog::Item;
use core_service::{CollectionTreeNode, CoreService};
use core_sync::naming::{author_last_names, extract_year};

const BRANCH: &str = "\u{251c}\u{2500}\u{2500} ";
const LAST_BRANCH: &str = "\u{2514}\u{2500}\u{2500} ";

async fn ensure_ready(core: &CoreService) -> Result<()> {
    let config = core.config();
    if !config.storage_path.is_dir() {
        bail!(
            "Zotero storage not found at {}",
            config.storage_path.display()
        );
    }
    if !core.check_connection().await {
        bail!(
            "Cannot reach the Zotero API at {}. Is Zotero running?",
            config.catalog_base_url
        );
    }
    Ok(())
}

pub async fn sync(core: &CoreService, once: bool) -> Result<()> {
    ensure_ready(core).await?;
    let config = core.config();
    println!("Storage: {}", config.storage_path.display());
    println!("Library: {}", config.library_root().display());

    let outcome = core.sync_now(&|msg: &str| println!("{msg}")).await?;
    println!(
        "{} copied, {} renamed, {} up to date, {} missing, {} failed, {} removed",
        outcome.copied,
        outcome.renamed,
        outcome.up_to_date,
        outcome.missing,
        outcome.failed,
        outcome.removed
    );

    if once {
        return Ok(());
    }

    core.start_watching().await?;
    println!("Watching for changes. Press Ctrl-C to stop.");
    tokio::signal::ctrl_c().await?;

    core.shutdown().await;
    Ok(())
}

pub async fn tree(core: &CoreService, json: bool) -> Result<()> {
    let tree = core.collection_tree().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tree)?);
        return Ok(());
    }

    println!("{}", core.config().library_dir.display());
    for (idx, node) in tree.iter().enumerate() {
        print_node(node, "", idx + 1 == tree.len());
    }
    Ok(())
}

fn print_node(node: &CollectionTreeNode, prefix: &str, is_last: bool) {
    let connector = if is_last { LAST_BRANCH } else { BRANCH };
    let name = node
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| node.name.clone());
    println!("{}{}{}/ ({})", prefix, connector, name, node.item_count);

    let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "\u{2502}   " });
    for (idx, child) in node.children.iter().enumerate() {
        print_node(child, &child_prefix, idx + 1 == node.children.len());
    }
}

pub async fn search(core: &CoreService, query: &str, json: bool) -> Result<()> {
    let items = core.search(query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No items match '{query}'");
    }
    for item in &items {
        println!("{}  {}", item.key, describe(item));
    }
    Ok(())
}

fn describe(item: &Item) -> String {
    let authors = author_last_names(item);
    let mut line = match authors.as_slice() {
        [] => String::new(),
        [only] => format!("{only} "),
        [first, ..] => format!("{first} et al. "),
    };
    if let Some(year) = extract_year(&item.date) {
        line.push_str(&format!("({year}) "));
    }
    line.push_str(&item.title);
    line
}

pub async fn bibtex(core: &CoreService, key: &str) -> Result<()> {
    let entry = core.bibtex(key).await?;
    println!("{}", entry.trim_end());
    Ok(())
}

pub async fn check(core: &CoreService) -> Result<()> {
    let url = core.config().catalog_base_url;
    if !core.check_connection().await {
        bail!("Cannot reach the Zotero API at {url}");
    }
    println!("Zotero API reachable at {url}");
    Ok(())
}
