use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use warfarin_core::*;

mod appointment;

use appointment::AppointmentInfo;

#[derive(Parser)]
#[command(name = "warfarin")]
#[command(about = "Warfarin weekly dosing regimen calculator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Suggest weekly regimens for a prescribed weekly dose
    Suggest {
        /// Prescribed total weekly dose in mg
        #[arg(long, allow_negative_numbers = true)]
        weekly_dose: f64,

        /// Tablet strengths in mg, comma separated (default: configured selection)
        #[arg(long, value_delimiter = ',')]
        pills: Vec<u32>,

        /// Whole tablets only
        #[arg(long)]
        no_half: bool,

        /// Special days (none, fri-sun, sat-sun, mon-wed-fri)
        #[arg(long)]
        pattern: Option<SpecialDayPattern>,

        /// Days until the next appointment
        #[arg(long, conflicts_with_all = ["from", "to"])]
        days: Option<u32>,

        /// First dispensed weekday (mon..sun or 0-6)
        #[arg(long, value_parser = parse_weekday, conflicts_with_all = ["from", "to"])]
        start_day: Option<u8>,

        /// First dispensed day (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,

        /// Appointment day (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,

        /// Number of regimens to show
        #[arg(long)]
        top: Option<usize>,

        /// Print the regimens as JSON
        #[arg(long)]
        json: bool,
    },

    /// List stocked tablet strengths and the default selection
    Tablets,

    /// Write a configuration file with default settings
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Options for the suggest command, gathered from the command line
struct SuggestArgs {
    weekly_dose: f64,
    pills: Vec<u32>,
    no_half: bool,
    pattern: Option<SpecialDayPattern>,
    days: Option<u32>,
    start_day: Option<u8>,
    dates: Option<(NaiveDate, NaiveDate)>,
    top: Option<usize>,
    json: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    warfarin_core::logging::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Suggest {
            weekly_dose,
            pills,
            no_half,
            pattern,
            days,
            start_day,
            from,
            to,
            top,
            json,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let args = SuggestArgs {
                weekly_dose,
                pills,
                no_half,
                pattern,
                days,
                start_day,
                dates: from.zip(to),
                top,
                json,
            };
            cmd_suggest(args, &config)
        }
        Commands::Tablets => {
            let config = load_config(cli.config.as_deref())?;
            cmd_tablets(&config);
            Ok(())
        }
        Commands::InitConfig { force } => cmd_init_config(cli.config, force),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn cmd_suggest(args: SuggestArgs, config: &Config) -> Result<()> {
    let appointment = match args.dates {
        Some((from, to)) => AppointmentInfo::from_dates(from, to)?,
        None => AppointmentInfo {
            days_until_appointment: args
                .days
                .unwrap_or(config.defaults.days_until_appointment),
            start_day_of_week: args.start_day.unwrap_or(config.defaults.start_day_of_week),
        },
    };

    let available_pills = if args.pills.is_empty() {
        config.inventory.selected.clone()
    } else {
        args.pills
    };

    let input = CalculationInput {
        weekly_dose: args.weekly_dose,
        allow_half: config.defaults.allow_half && !args.no_half,
        available_pills,
        special_day_pattern: args
            .pattern
            .unwrap_or(config.defaults.special_day_pattern),
        days_until_appointment: appointment.days_until_appointment,
        start_day_of_week: appointment.start_day_of_week,
    };

    // Reject bad input here so "no regimen" only ever means infeasible
    input.validate()?;
    tracing::debug!("Calculating with {:?}", input);

    let mut limits = config.search.clone();
    if let Some(top) = args.top {
        limits.max_suggestions = top.max(1);
    }

    let options = generate_suggestions_with(&input, &limits);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&options)?);
        return Ok(());
    }

    if options.is_empty() {
        println!("No suitable regimen found for these constraints.");
        if !input.allow_half {
            println!("Try allowing half tablets.");
        }
        return Ok(());
    }

    for (index, option) in options.iter().enumerate() {
        display_option(index + 1, option, input.weekly_dose);
    }

    Ok(())
}

fn cmd_tablets(config: &Config) {
    let inventory = config.inventory.to_inventory();
    println!("Stocked tablet strengths:");
    for tablet in &inventory.tablets {
        let marker = if tablet.available { "selected" } else { "" };
        println!("  {:>3} mg  {}", tablet.strength_mg, marker);
    }
}

fn cmd_init_config(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = path.unwrap_or_else(Config::default_config_path);

    if path.exists() && !force {
        println!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        );
        return Ok(());
    }

    Config::default().save_to(&path)?;
    println!("✓ Wrote default config to {}", path.display());
    Ok(())
}

fn display_option(number: usize, option: &RegimenOption, weekly_target: f64) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  Option {}: {}", number, option.description);
    println!("╰─────────────────────────────────────────╯");
    println!();

    let actual = option.weekly_dose_actual;
    if (actual - weekly_target).abs() < DOSE_EPSILON {
        println!("  Weekly total: {} mg", format_mg(actual));
    } else {
        println!(
            "  Weekly total: {} mg (target {} mg)",
            format_mg(actual),
            format_mg(weekly_target)
        );
    }
    println!();

    for day in &option.weekly_schedule {
        let marker = if day.is_special_day { "*" } else { " " };
        let tablets = if day.is_stop_day {
            "no dose".to_string()
        } else {
            day.pills
                .iter()
                .map(pill_text)
                .collect::<Vec<_>>()
                .join(" + ")
        };
        println!(
            "  {}{} {:>7}   {}",
            day.day_name(),
            marker,
            format!("{} mg", format_mg(day.total_dose_mg)),
            tablets
        );
    }

    let summary = &option.total_pills_summary;
    println!();
    println!("  {}", summary.header);
    for line in &summary.pill_lines {
        if line.usage_note.is_empty() {
            println!("    {} mg: {} tablets", line.strength_mg, line.dispensed_count);
        } else {
            println!(
                "    {} mg: {} tablets ({})",
                line.strength_mg, line.dispensed_count, line.usage_note
            );
        }
    }
}

/// "5 mg × 1½"
fn pill_text(pill: &PillUsage) -> String {
    let quantity = match (pill.whole_tablets(), pill.is_half) {
        (0, true) => "½".to_string(),
        (whole, true) => format!("{}½", whole),
        (whole, false) => whole.to_string(),
    };
    format!("{} mg × {}", pill.strength_mg, quantity)
}

fn parse_weekday(value: &str) -> std::result::Result<u8, String> {
    if let Ok(index) = value.parse::<u8>() {
        if (index as usize) < DAYS_PER_WEEK {
            return Ok(index);
        }
    }

    let lower = value.trim().to_lowercase();
    DAY_NAMES
        .iter()
        .position(|name| lower.starts_with(&name.to_lowercase()))
        .map(|index| index as u8)
        .ok_or_else(|| format!("unknown weekday '{}' (use mon..sun or 0-6)", value))
}
