//! `bini routes`: regenerate the router and print the route table.

use crate::cli::RoutesArgs;
use crate::commands::utils;
use crate::config::ConfigOverrides;
use crate::error::Result;
use crate::ui;
use bini_router::table::{NotFoundRoute, RouteElement};
use crate::plugins::project_plugins;
use bini_router::{RouteTable, RouterConfig};
use owo_colors::OwoColorize;
use serde::Serialize;

/// One route as reported to users and to `/__bini_routes__`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
    pub path: String,
    pub dynamic: bool,
    /// Module the route lazily imports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// Page file rendered as a placeholder because it has no default export
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

/// The whole route listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteListing {
    pub router_file: String,
    pub routes: Vec<RouteSummary>,
    /// Custom not-found module, or `null` for the built-in page
    pub not_found: Option<String>,
}

impl RouteListing {
    pub fn from_table(table: &RouteTable, router: &RouterConfig) -> Self {
        let routes = table
            .routes
            .iter()
            .map(|route| {
                let (module, placeholder) = match &route.element {
                    RouteElement::Component(ident) => (
                        table
                            .imports
                            .iter()
                            .find(|import| &import.ident == ident)
                            .map(|import| import.module_path.clone()),
                        None,
                    ),
                    RouteElement::Placeholder { page_path } => (None, Some(page_path.clone())),
                };
                RouteSummary {
                    path: route.path.clone(),
                    dynamic: route.dynamic,
                    module,
                    placeholder,
                }
            })
            .collect();

        let router_path = router.router_path();
        let router_file = router_path
            .strip_prefix(&router.root)
            .unwrap_or(&router_path)
            .display()
            .to_string();

        Self {
            router_file,
            routes,
            not_found: match &table.not_found {
                NotFoundRoute::Custom { module_path } => Some(module_path.clone()),
                NotFoundRoute::Builtin => None,
            },
        }
    }

    /// Scan the pages root now.
    pub fn current(router: &RouterConfig) -> Self {
        Self::from_table(&bini_router::build_table(router), router)
    }
}

/// Execute the routes command.
pub async fn execute(args: RoutesArgs) -> Result<()> {
    let (root, config) = utils::load_project(args.cwd.as_deref(), &ConfigOverrides::default())?;
    let router = config.to_router_config(&root);

    if !router.pages_root().is_dir() {
        ui::warning(&format!(
            "{} directory not found - file-based routing disabled",
            config.app_dir.display()
        ));
    }

    let plugins = project_plugins(&router);
    let spinner = (!args.json).then(|| ui::Spinner::new("Scanning routes..."));
    if let Err(e) = plugins.build_start() {
        if let Some(ref spinner) = spinner {
            spinner.fail("Router generation failed");
        }
        return Err(e.into());
    }

    let listing = RouteListing::current(&router);
    if let Some(spinner) = spinner {
        spinner.finish(&format!("Found {} routes", listing.routes.len()));
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        print_listing(&listing);
        if router.router_path().is_file() {
            ui::success(&format!("Router written to {}", listing.router_file));
        }
    }
    Ok(())
}

fn print_listing(listing: &RouteListing) {
    let width = listing
        .routes
        .iter()
        .map(|r| r.path.len())
        .max()
        .unwrap_or(0)
        .max(5);

    println!("{}", format!("Routes ({})", listing.routes.len()).bold());
    for route in &listing.routes {
        let target = match (&route.module, &route.placeholder) {
            (Some(module), _) => module.clone(),
            (None, Some(page)) => format!("{} (no default export)", page),
            (None, None) => String::new(),
        };
        let path = format!("{:width$}", route.path, width = width);
        if route.dynamic {
            println!("  {}  {}", path.yellow(), target.dimmed());
        } else {
            println!("  {}  {}", path.cyan(), target.dimmed());
        }
    }

    let not_found = listing
        .not_found
        .clone()
        .unwrap_or_else(|| "built-in 404".to_string());
    println!(
        "  {}  {}",
        format!("{:width$}", "*", width = width).dimmed(),
        not_found.dimmed()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_listing_reports_modules_and_placeholders() {
        let temp = TempDir::new().unwrap();
        let app = temp.path().join("src/app");
        fs::create_dir_all(app.join("blog/[slug]")).unwrap();
        fs::create_dir_all(app.join("draft")).unwrap();
        fs::write(app.join("page.jsx"), "export default function Home() {}").unwrap();
        fs::write(app.join("blog/[slug]/page.jsx"), "export default () => null;").unwrap();
        fs::write(app.join("draft/page.jsx"), "").unwrap();

        let router = RouterConfig::new(temp.path());
        let listing = RouteListing::current(&router);

        assert_eq!(listing.router_file, "src/App.jsx");
        assert_eq!(listing.not_found, None);

        let paths: Vec<_> = listing.routes.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/", "/draft", "/blog/:slug"]);

        let slug = &listing.routes[2];
        assert!(slug.dynamic);
        assert_eq!(slug.module.as_deref(), Some("./app/blog/[slug]/page"));

        let draft = &listing.routes[1];
        assert!(draft.module.is_none());
        assert_eq!(draft.placeholder.as_deref(), Some("app/draft/page.jsx"));
    }

    #[test]
    fn test_listing_json_shape() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src/app")).unwrap();
        fs::write(
            temp.path().join("src/app/not-found.jsx"),
            "export default function NotFound() {}",
        )
        .unwrap();

        let listing = RouteListing::current(&RouterConfig::new(temp.path()));
        let json = serde_json::to_value(&listing).unwrap();

        assert_eq!(json["routerFile"], "src/App.jsx");
        assert_eq!(json["notFound"], "./app/not-found");
        assert_eq!(json["routes"].as_array().unwrap().len(), 0);
    }
}
