use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde::Serialize;

use gym_log_lib::activity::ActivityWindow;
use gym_log_lib::analysis::VolumeRange;
use gym_log_lib::commands::{self, analytics, assistant, transfer as transfer_cmd};
use gym_log_lib::config::Config;
use gym_log_lib::llm::{ChatTurn, ConversationStage};
use gym_log_lib::models::{User, WorkoutType};
use gym_log_lib::muscle_analyzer::MuscleRegion;
use gym_log_lib::transfer::{export_file_name, session_from_value, ExportFormat};

#[derive(Parser)]
#[command(name = "gym-log")]
#[command(about = "Strength-training log with muscle-group analytics", version)]
struct Cli {
  #[command(subcommand)]
  command: Commands,

  /// Whose log to use (Nav or Delchan)
  #[arg(short, long, global = true, default_value = "Nav")]
  user: User,

  /// Evaluate date windows as of this day instead of today (YYYY-MM-DD)
  #[arg(long, global = true)]
  today: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
  /// List workouts, newest first
  List {
    #[arg(short, long)]
    limit: Option<usize>,
  },

  /// Show one workout
  Show { id: String },

  /// Add a workout from a JSON file (or stdin when omitted)
  Add { file: Option<PathBuf> },

  /// Delete a workout
  Delete { id: String },

  /// Delete every workout of the selected user
  Clear {
    /// Required confirmation
    #[arg(long)]
    yes: bool,
  },

  /// Import workouts from an exported JSON file
  Import { file: PathBuf },

  /// Export workouts as JSON or CSV
  Export {
    #[arg(short, long, default_value = "json")]
    format: ExportFormat,

    /// Output file; `-` writes to stdout. Defaults to `<user>-workouts-<date>.<ext>`
    #[arg(short, long)]
    output: Option<PathBuf>,
  },

  /// Dashboard statistics
  Stats,

  /// Per-muscle workout counts and volume
  Muscles {
    /// Only list workouts that hit this muscle
    #[arg(short, long, conflicts_with = "workout_type")]
    region: Option<MuscleRegion>,

    /// Show the muscles a split targets instead (arms, push, pull, legs)
    #[arg(short, long)]
    workout_type: Option<WorkoutType>,
  },

  /// Category activity with trend against the previous window
  Heatmap {
    #[arg(short, long, default_value = "month")]
    window: ActivityWindow,
  },

  /// Strength progression per exercise
  Progression {
    #[arg(short, long)]
    exercise: Option<String>,
  },

  /// Personal records
  Records,

  /// Daily training volume over a range
  Volume {
    /// week, month, 3months, 6months or year
    #[arg(short, long, default_value = "3months")]
    range: VolumeRange,
  },

  /// Turn a description into a workout
  Generate {
    description: String,

    /// Store the generated workout
    #[arg(long)]
    save: bool,
  },

  /// One turn of the conversational logger
  Chat {
    message: String,

    #[arg(long, default_value = "initial")]
    stage: ConversationStage,

    /// Workout collected so far, as JSON
    #[arg(long)]
    draft: Option<String>,
  },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

fn read_input(file: Option<&PathBuf>) -> Result<String> {
  match file {
    Some(path) => fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display())),
    None => {
      let mut text = String::new();
      io::stdin().read_to_string(&mut text).context("Failed to read stdin")?;
      Ok(text)
    }
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  dotenvy::dotenv().ok();

  let config = Config::from_env()?;
  gym_log_lib::logging::init(&config.log_filter);

  let user = cli.user;
  let today = cli.today.unwrap_or_else(|| Local::now().date_naive());

  let state = gym_log_lib::open(config).await?;

  match cli.command {
    Commands::List { limit } => {
      print_json(&commands::list_workouts(&state, user, limit).await.map_err(anyhow::Error::msg)?)?;
    }
    Commands::Show { id } => {
      let session = commands::get_workout(&state, &id)
        .await
        .map_err(anyhow::Error::msg)?
        .ok_or_else(|| anyhow!("No workout with id {}", id))?;
      print_json(&session)?;
    }
    Commands::Add { file } => {
      let text = read_input(file.as_ref())?;
      let mut value: serde_json::Value = serde_json::from_str(&text).context("Invalid JSON")?;
      if let Some(obj) = value.as_object_mut() {
        obj.insert("user".into(), user.as_str().into());
      }
      let session = session_from_value(&value, user).map_err(anyhow::Error::msg)?;
      print_json(&commands::add_workout(&state, session).await.map_err(anyhow::Error::msg)?)?;
    }
    Commands::Delete { id } => {
      if !commands::delete_workout(&state, &id).await.map_err(anyhow::Error::msg)? {
        bail!("No workout with id {}", id);
      }
      eprintln!("Deleted {}", id);
    }
    Commands::Clear { yes } => {
      if !yes {
        bail!("Refusing to delete all of {}'s workouts without --yes", user);
      }
      let removed = commands::clear_user_data(&state, user).await.map_err(anyhow::Error::msg)?;
      eprintln!("Removed {} workouts for {}", removed, user);
    }
    Commands::Import { file } => {
      let text = read_input(Some(&file))?;
      let report = transfer_cmd::import_workouts(&state, user, &text)
        .await
        .map_err(anyhow::Error::msg)?;
      print_json(&report)?;
    }
    Commands::Export { format, output } => {
      let content = transfer_cmd::export_workouts(&state, user, format)
        .await
        .map_err(anyhow::Error::msg)?;
      let path = output.unwrap_or_else(|| PathBuf::from(export_file_name(user, format, today)));
      if path.as_os_str() == "-" {
        println!("{}", content);
      } else {
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("Exported to {}", path.display());
      }
    }
    Commands::Stats => {
      print_json(&analytics::get_dashboard_stats(&state, user, today).await.map_err(anyhow::Error::msg)?)?;
    }
    Commands::Muscles { region, workout_type } => match (region, workout_type) {
      (_, Some(workout_type)) => {
        print_json(&analytics::get_targeted_muscles(workout_type))?;
      }
      (Some(region), None) => {
        let sessions = analytics::get_workouts_for_muscle(&state, user, region)
          .await
          .map_err(anyhow::Error::msg)?;
        print_json(&sessions)?;
      }
      (None, None) => {
        print_json(&analytics::get_muscle_analysis(&state, user).await.map_err(anyhow::Error::msg)?)?;
      }
    },
    Commands::Heatmap { window } => {
      let report = analytics::get_activity_heatmap(&state, user, window, today)
        .await
        .map_err(anyhow::Error::msg)?;
      print_json(&report)?;
    }
    Commands::Progression { exercise } => {
      let report = analytics::get_strength_progression(&state, user, exercise.as_deref())
        .await
        .map_err(anyhow::Error::msg)?;
      print_json(&report)?;
    }
    Commands::Records => {
      print_json(&analytics::get_personal_records(&state, user).await.map_err(anyhow::Error::msg)?)?;
    }
    Commands::Volume { range } => {
      let trends = analytics::get_volume_trends(&state, user, range, today)
        .await
        .map_err(anyhow::Error::msg)?;
      print_json(&trends)?;
    }
    Commands::Generate { description, save } => {
      let session = assistant::generate_workout(&state, user, &description, today, save)
        .await
        .map_err(anyhow::Error::msg)?;
      print_json(&session)?;
    }
    Commands::Chat { message, stage, draft } => {
      let current_workout_data = match draft {
        Some(raw) => serde_json::from_str(&raw).context("Invalid --draft JSON")?,
        None => serde_json::Value::Null,
      };
      let turn = ChatTurn {
        user_input: message,
        current_workout_data,
        conversation_stage: stage,
        user,
      };
      print_json(&assistant::chat_turn(&state, &turn, today).await.map_err(anyhow::Error::msg)?)?;
    }
  }

  Ok(())
}
