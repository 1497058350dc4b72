//! The `trialkit init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("trialkit.toml").exists() {
        println!("trialkit.toml already exists, skipping.");
    } else {
        std::fs::write("trialkit.toml", SAMPLE_CONFIG)?;
        println!("Created trialkit.toml");
    }

    if std::path::Path::new("targets.json").exists() {
        println!("targets.json already exists, skipping.");
    } else {
        std::fs::write("targets.json", SAMPLE_TARGETS)?;
        println!("Created targets.json");
    }

    println!("\nNext steps:");
    println!("  1. Add images under assets/ and list them in targets.json");
    println!("  2. Run: trialkit validate");
    println!("  3. Run: trialkit drill --client \"Name\" --decks nouns,actions");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# trialkit configuration

targets = "targets.json"
store_path = ".trialkit/settings.json"
output_dir = "./trialkit-results"

# always_advance | repeat_on_error
drill_policy = "always_advance"
match_policy = "repeat_on_error"

correct_delay_ms = 650
correction_delay_ms = 900
# pause before the drill moves on after a response
drill_advance_delay_ms = 0
array_size = 4
"#;

const SAMPLE_TARGETS: &str = r#"[
  {
    "id": "apple",
    "deck": "nouns",
    "label": "apple",
    "exemplars": ["assets/nouns/apple_1.png", "assets/nouns/apple_2.png", "assets/nouns/apple_3.png"]
  },
  {
    "id": "cup",
    "deck": "nouns",
    "label": "cup",
    "exemplars": ["assets/nouns/cup_1.png", "assets/nouns/cup_2.png"]
  },
  {
    "id": "jumping",
    "deck": "actions",
    "label": "jumping",
    "exemplars": ["assets/actions/jumping_1.gif", "assets/actions/jumping_2.gif"]
  },
  {
    "id": "boy_eating",
    "deck": "combos",
    "label": "boy eating",
    "exemplars": ["assets/combos/boy_eating_1.png"]
  },
  {
    "id": "she",
    "deck": "pronouns",
    "label": "she",
    "exemplars": ["assets/pronouns/she_1.png"]
  },
  {
    "id": "ball_under_table",
    "deck": "prepositions",
    "label": "under",
    "prompt_object": "ball",
    "exemplars": ["assets/prepositions/ball_under_table_1.png"]
  }
]
"#;
