// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 The Arachne Project

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use arachne_client::models::query::Query;
use arachne_client::services::entity::{DataserviceConfig, EntityClient};
use arachne_client::services::search::SearchService;

#[derive(Parser)]
#[command(
    name = "arachne-client",
    version,
    about = "Command line client for the Arachne object catalog"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search the catalog and print one page of results
    Search(SearchArgs),
    /// Fetch a single entity document as JSON
    Entity {
        /// Numeric entity identifier
        id: u64,
    },
    /// Print the catalog news feed as JSON
    News {
        /// Feed language
        #[arg(long, default_value = "de")]
        lang: String,
    },
}

#[derive(Args)]
struct SearchArgs {
    /// Free-text search term
    term: Option<String>,
    /// Facet filter in key:value form, repeatable
    #[arg(long = "facet", value_name = "KEY:VALUE")]
    facets: Vec<String>,
    /// Result offset to start the page at
    #[arg(long, default_value_t = 0)]
    offset: u64,
    /// Field to sort results by
    #[arg(long)]
    sort: Option<String>,
    /// Sort in descending order
    #[arg(long)]
    desc: bool,
    /// Only records where this field is present
    #[arg(long)]
    restrict: Option<String>,
    /// Catalog id to scope the search to
    #[arg(long)]
    catalog: Option<String>,
    /// Print the facet overview after the results
    #[arg(long)]
    show_facets: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = DataserviceConfig::from_env();
    let client = Arc::new(
        EntityClient::new(&config).context("failed to set up the dataservice client")?,
    );

    match cli.command {
        Command::Search(args) => run_search(client, &config, &args).await,
        Command::Entity { id } => run_entity(&client, id).await,
        Command::News { lang } => run_news(&client, &lang).await,
    }
}

async fn run_search(
    client: Arc<EntityClient>,
    config: &DataserviceConfig,
    args: &SearchArgs,
) -> Result<()> {
    if let Some(sort) = &args.sort {
        if !config.sortable_fields.contains(sort) {
            bail!(
                "cannot sort by '{sort}', the service supports {}",
                config.sortable_fields.join(", ")
            );
        }
    }

    let service = SearchService::new(client, build_query(args)?);
    let page = service.get_current_page().await.context("search request failed")?;

    let query = service.current_query();
    let total = service.get_size().unwrap_or(0);
    let url_string = query.to_url_string();
    if url_string.is_empty() {
        println!("{total} results");
    } else {
        println!("{total} results for {url_string}");
    }

    for (index, entity) in page.iter().enumerate() {
        let rank = query.offset() + index as u64 + 1;
        let title = entity.title.as_deref().unwrap_or("(untitled)");
        match &entity.subtitle {
            Some(subtitle) => println!("{rank:>6}  {title} ({subtitle})  [{}]", entity.entity_id),
            None => println!("{rank:>6}  {title}  [{}]", entity.entity_id),
        }
    }

    if args.show_facets {
        if let Some(facets) = service.get_facets() {
            for (name, values) in &facets {
                println!("{name}");
                for value in values.iter().take(10) {
                    println!("    {} ({})", value.value, value.count);
                }
            }
        }
    }
    Ok(())
}

async fn run_entity(client: &EntityClient, entity_id: u64) -> Result<()> {
    let document = client
        .get_entity(entity_id)
        .await
        .with_context(|| format!("failed to fetch entity {entity_id}"))?;
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

async fn run_news(client: &EntityClient, language: &str) -> Result<()> {
    let news = client
        .get_news(language)
        .await
        .context("failed to fetch the news feed")?;
    println!("{}", serde_json::to_string_pretty(&news)?);
    Ok(())
}

fn build_query(args: &SearchArgs) -> Result<Query> {
    let mut query = Query::new();
    if let Some(term) = &args.term {
        query = query.set_param("q", term.as_str());
    }
    for raw in &args.facets {
        let (key, value) = raw
            .split_once(':')
            .with_context(|| format!("facet filter '{raw}' is not in key:value form"))?;
        query = query.add_facet(key, value);
    }
    if args.offset > 0 {
        query = query.set_param("offset", args.offset);
    }
    if let Some(sort) = &args.sort {
        query = query.set_param("sort", sort.as_str());
    }
    if args.desc {
        query = query.set_param("desc", "true");
    }
    if let Some(restrict) = &args.restrict {
        query = query.set_param("restrict", restrict.as_str());
    }
    if let Some(catalog) = &args.catalog {
        query = query.set_param("catalogIds", catalog.as_str());
    }
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn search_args() -> SearchArgs {
        SearchArgs {
            term: None,
            facets: Vec::new(),
            offset: 0,
            sort: None,
            desc: false,
            restrict: None,
            catalog: None,
            show_facets: false,
        }
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_build_query_maps_arguments() {
        let args = SearchArgs {
            term: Some("vase".to_string()),
            facets: vec!["facet_category:Keramik".to_string()],
            offset: 100,
            sort: Some("title".to_string()),
            desc: true,
            ..search_args()
        };

        let query = build_query(&args).unwrap();
        assert_eq!(query.q(), Some("vase"));
        assert!(query.has_facet("facet_category"));
        assert_eq!(query.offset(), 100);
        assert_eq!(query.sort(), Some("title"));
        assert_eq!(query.desc(), Some("true"));
    }

    #[test]
    fn test_build_query_rejects_malformed_facet() {
        let args = SearchArgs {
            facets: vec!["nocolon".to_string()],
            ..search_args()
        };
        assert!(build_query(&args).is_err());
    }
}
