use std::env;
use std::process::ExitCode;

use log::error;

use recipe_saver::{AppConfig, Category, DocumentId, Recipe, RecipeSaver, SearchCriteria};

const USAGE: &str = "\
Usage: recipe-saver <command> [args]

Commands:
  list                                   approved recipes
  search [--name N] [--chef C] [--category K]
  pending                                recipes awaiting approval (admin)
  approve <id>                           approve a recipe (admin)
  delete <id>                            delete a recipe (admin)
  chefs                                  featured chefs

Admin commands sign in with RECIPE_SAVER_EMAIL and RECIPE_SAVER_PASSWORD.";

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let command = args.first().ok_or(USAGE)?;
    let config = AppConfig::load()?;
    // A chef catalog that fails to decode aborts startup here
    let app = RecipeSaver::from_config(&config)?;

    match command.as_str() {
        "list" => print_recipes(&app.directory.list_approved().await?),
        "search" => {
            let criteria = parse_search(&args[1..])?;
            print_recipes(&app.directory.search(&criteria).await?);
        }
        "pending" => {
            sign_in_admin(&app).await?;
            print_recipes(&app.directory.list_pending().await?);
        }
        "approve" => {
            let id = document_id(args)?;
            sign_in_admin(&app).await?;
            app.directory.approve(&id).await?;
            println!("Recipe approved successfully!");
        }
        "delete" => {
            let id = document_id(args)?;
            sign_in_admin(&app).await?;
            app.directory.delete(&id).await?;
            println!("Recipe deleted successfully!");
        }
        "chefs" => {
            for chef in app.chefs.iter() {
                println!("{} ({})", chef.name, chef.channel);
                for video in &chef.videos {
                    println!("  - {}: {}", video.caption, video.url);
                }
            }
        }
        _ => return Err(USAGE.into()),
    }

    Ok(())
}

async fn sign_in_admin(app: &RecipeSaver) -> Result<(), Box<dyn std::error::Error>> {
    let email = env::var("RECIPE_SAVER_EMAIL")?;
    let password = env::var("RECIPE_SAVER_PASSWORD")?;
    let session = app.accounts.sign_in(&email, &password).await?;
    session.require_admin()?;
    Ok(())
}

fn document_id(args: &[String]) -> Result<DocumentId, Box<dyn std::error::Error>> {
    let id = args.get(1).ok_or("missing recipe id")?;
    Ok(DocumentId::new(id.as_str()))
}

fn parse_search(args: &[String]) -> Result<SearchCriteria, Box<dyn std::error::Error>> {
    let mut criteria = SearchCriteria::new();
    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        let value = iter
            .next()
            .ok_or_else(|| format!("{} needs a value", flag))?;
        match flag.as_str() {
            "--name" => criteria = criteria.name(value.as_str()),
            "--chef" => criteria = criteria.chef_name(value.as_str()),
            "--category" => criteria = criteria.category(value.parse::<Category>()?),
            _ => return Err(format!("unknown search option: {}", flag).into()),
        }
    }
    Ok(criteria)
}

fn print_recipes(recipes: &[Recipe]) {
    if recipes.is_empty() {
        println!("No recipes found.");
        return;
    }
    for recipe in recipes {
        let id = recipe
            .document_id
            .as_ref()
            .map(DocumentId::as_str)
            .unwrap_or("-");
        println!(
            "{}  {} | Chef: {} | Category: {} | Published on: {}",
            id, recipe.name, recipe.chef_name, recipe.category, recipe.date_published
        );
    }
}
