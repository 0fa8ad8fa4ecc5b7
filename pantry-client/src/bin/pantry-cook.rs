use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pantry::{IngredientList, Recipe};
use pantry_client::{GeminiClient, GeminiConfig, Kitchen};

/// Turn whatever is in your kitchen into a recipe
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Ingredients you have on hand
    ingredients: Vec<String>,
    /// Start from the usual staples (salt, sugar, corn flour, water, oil, eggs, cream)
    #[arg(short, long)]
    staples: bool,
    /// Where to save the photo of the dish
    #[arg(short, long, default_value = "recipe.jpg")]
    output: PathBuf,
    /// Skip the photo entirely; only the recipe is requested
    #[arg(long)]
    no_image: bool,
    /// Print the recipe as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn print_recipe(recipe: &Recipe) {
    println!("{}", recipe.name);
    println!("{}", recipe.description);
    println!();
    println!(
        "Prep: {}  Cook: {}  Serves: {}",
        recipe.prep_time, recipe.cook_time, recipe.servings
    );
    println!();
    println!("Ingredients:");
    for item in &recipe.ingredients {
        println!("  - {}", item);
    }
    println!();
    println!("Instructions:");
    for (number, step) in recipe.instructions.iter().enumerate() {
        println!("  {}. {}", number + 1, step);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = GeminiConfig::from_env()?;
    let client = GeminiClient::new(config);

    let mut ingredients = if args.staples {
        IngredientList::with_staples()
    } else {
        IngredientList::new()
    };
    for item in &args.ingredients {
        ingredients.add(item);
    }

    let mut kitchen = Kitchen::with_ingredients(ingredients);
    if args.no_image {
        kitchen = kitchen.without_image();
    }
    println!("Ingredients: {}", kitchen.ingredients().joined(", "));
    kitchen.generate(&client).await?;

    let recipe = kitchen
        .recipe()
        .context("No recipe after a successful generation")?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(recipe)?);
    } else {
        print_recipe(recipe);
    }

    match kitchen.image() {
        Some(image) => {
            let path = args.output.with_extension(image.extension());
            std::fs::write(&path, &image.content_bytes)
                .with_context(|| format!("Saving photo to {}", path.display()))?;
            tracing::info!("Saved photo to {}", path.display());
        }
        None if args.no_image => {}
        None => tracing::warn!("No photo was generated for this recipe"),
    }

    Ok(())
}
