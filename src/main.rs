//! Dugout CLI
//!
//! Pulls schedules, recent results, stat leaders and rosters from public
//! team pages.

use clap::{Parser, Subcommand};
use dugout::{Config, Result};

#[derive(Parser)]
#[command(name = "dugout")]
#[command(about = "Team schedules, results, leaders and rosters from public league pages", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "dugout.toml", global = true)]
    config: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Cache directory for fetched pages
    #[arg(long, global = true)]
    cache: Option<String>,

    /// Use only cached pages (no network requests)
    #[arg(long, global = true)]
    offline: bool,

    /// Pretend the current time is this RFC 3339 timestamp
    #[arg(long, global = true)]
    now: Option<String>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init,
    /// List the league's teams
    Teams,
    /// Most recent completed games for a team
    Games {
        /// Team name, abbreviation or slug
        team: String,
        /// Override the number of games
        #[arg(long)]
        max: Option<usize>,
    },
    /// Next scheduled game for a team
    Next {
        /// Team name, abbreviation or slug
        team: String,
    },
    /// Stat leaders and standing for a team
    Leaders {
        /// Team name, abbreviation or slug
        team: String,
    },
    /// Roster grouped by position
    Roster {
        /// Team name, abbreviation or slug
        team: String,
    },
    /// Extract every team (or the given ones) in parallel
    Sync {
        /// Only these teams (repeatable)
        #[arg(long)]
        team: Vec<String>,
        /// Write the JSON report to this file
        #[arg(long)]
        output: Option<String>,
    },
}

#[derive(Clone, Copy, Debug)]
enum OutputFormat {
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use table or json.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let mut config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    if let Some(dir) = cli.cache {
        config.source.cache_dir = Some(dir);
    }
    if cli.offline {
        config.source.offline = true;
    }

    let now = cli.now.as_deref();
    let format = cli.format;

    // Run command
    let result = match cli.command {
        Commands::Init => commands::init(&cli.config),
        Commands::Teams => commands::teams(config, now, format),
        Commands::Games { team, max } => commands::games(config, now, &team, max, format),
        Commands::Next { team } => commands::next(config, now, &team, format),
        Commands::Leaders { team } => commands::leaders(config, now, &team, format),
        Commands::Roster { team } => commands::roster(config, now, &team, format),
        Commands::Sync { team, output } => {
            commands::sync(config, now, &team, output.as_deref(), format)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use dugout::data::extractor::fetch_directory;
    use dugout::data::scrapers::teams::TeamDirectory;
    use dugout::data::{
        BatchRunner, CancelFlag, Clock, FixedClock, HttpSource, SystemClock, TeamExtractor,
    };
    use dugout::{NextGame, TeamMeta};
    use serde::Serialize;

    /// Fetch collaborators plus the team directory, shared by every command
    struct Session {
        config: Config,
        source: HttpSource,
        clock: Box<dyn Clock>,
        directory: TeamDirectory,
    }

    impl Session {
        pub fn open(config: Config, now: Option<&str>) -> Result<Self> {
            let source = HttpSource::from_config(&config.source)?;
            let clock: Box<dyn Clock> = match now {
                Some(ts) => Box::new(FixedClock::parse_rfc3339(ts)?),
                None => Box::new(SystemClock),
            };
            let zone = config.reference_zone()?;
            let directory = fetch_directory(&source, clock.as_ref(), zone, &config.league)?;

            Ok(Session {
                config,
                source,
                clock,
                directory,
            })
        }

        fn extractor(&self) -> Result<TeamExtractor<'_>> {
            TeamExtractor::from_config(&self.source, self.clock.as_ref(), &self.config, &self.directory)
        }

        fn team(&self, name: &str) -> Result<&TeamMeta> {
            self.directory.find(name)
        }
    }

    fn print_json<T: Serialize>(value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Run 'dugout teams' to list the league's teams");
        println!("  3. Run 'dugout games \"Chicago Cubs\"' for recent results");
        println!("  4. Run 'dugout sync --output league.json' to extract every team");

        Ok(())
    }

    pub fn teams(
        config: Config,
        now: Option<&str>,
        format: OutputFormat,
    ) -> Result<()> {
        let session = Session::open(config, now)?;
        if let OutputFormat::Json = format {
            let teams: Vec<&TeamMeta> = session.directory.iter().collect();
            return print_json(&teams);
        }

        println!("{:<28} {:<6} {}", "Team", "Abbr", "Slug");
        println!("{}", "─".repeat(60));
        for team in session.directory.iter() {
            println!("{:<28} {:<6} {}", team.display_name, team.abbreviation, team.slug);
        }
        println!("\n{} teams", session.directory.len());

        Ok(())
    }

    pub fn games(
        config: Config,
        now: Option<&str>,
        name: &str,
        max: Option<usize>,
        format: OutputFormat,
    ) -> Result<()> {
        let session = Session::open(config, now)?;
        let team = session.team(name)?;
        let mut extractor = session.extractor()?;
        if let Some(max) = max {
            extractor = extractor.with_max_games(max);
        }
        let history = extractor.recent_games(team)?;

        if let OutputFormat::Json = format {
            return print_json(&history);
        }

        println!("{} ({} season)", history.team, history.season_year);
        println!("───────────────────────────────────────────────");
        if let Some(advisory) = &history.advisory {
            println!("  Note: {}", advisory);
        }
        if let Some(record) = &history.record {
            println!("  Record: {}", record);
        }
        for game in &history.games {
            println!(
                "  {}  {}  {:<24} {:>2}-{:<2} ({:+})",
                game.date.format("%Y-%m-%d"),
                if game.won { "W" } else { "L" },
                game.opponent,
                game.team_score,
                game.opponent_score,
                game.margin()
            );
        }

        Ok(())
    }

    pub fn next(
        config: Config,
        now: Option<&str>,
        name: &str,
        format: OutputFormat,
    ) -> Result<()> {
        let session = Session::open(config, now)?;
        let team = session.team(name)?;
        let next = session.extractor()?.next_game(team)?;

        if let OutputFormat::Json = format {
            return print_json(&next);
        }

        match next {
            NextGame::Scheduled(game) => {
                println!("{} vs {}", game.team, game.opponent);
                println!("  {} at {}", game.date_text, game.scheduled_at.format("%-I:%M %p (UTC%:z)"));
            }
            NextGame::NoUpcomingGames => println!("{}: no upcoming games", team.display_name),
        }

        Ok(())
    }

    pub fn leaders(
        config: Config,
        now: Option<&str>,
        name: &str,
        format: OutputFormat,
    ) -> Result<()> {
        let session = Session::open(config, now)?;
        let team = session.team(name)?;
        let (stats, issue) = session.extractor()?.stats(team)?;

        if let OutputFormat::Json = format {
            return print_json(&stats);
        }

        println!("{}", team.display_name);
        println!("───────────────────────────────");
        match &stats.standing {
            Some(standing) => println!("  Standing: {}", standing.label),
            None => println!("  Standing: unknown"),
        }
        if let Some(e) = issue {
            println!("  Leaders unavailable: {}", e);
        }
        for leader in &stats.leaders {
            println!("  {:<28} {}", leader.player_name, leader.position);
        }

        Ok(())
    }

    pub fn roster(
        config: Config,
        now: Option<&str>,
        name: &str,
        format: OutputFormat,
    ) -> Result<()> {
        let session = Session::open(config, now)?;
        let team = session.team(name)?;
        let roster = session.extractor()?.roster(team)?;

        if let OutputFormat::Json = format {
            return print_json(&roster);
        }

        println!("{} roster ({} players)", roster.team, roster.players.len());
        for (group, players) in roster.by_group() {
            println!("\n{}", group);
            println!("───────────────────────────────");
            for player in players {
                println!("  {:<28} {}", player.name, player.position);
            }
        }

        Ok(())
    }

    pub fn sync(
        config: Config,
        now: Option<&str>,
        names: &[String],
        output: Option<&str>,
        format: OutputFormat,
    ) -> Result<()> {
        let session = Session::open(config, now)?;
        let teams: Vec<&TeamMeta> = if names.is_empty() {
            session.directory.iter().collect()
        } else {
            names
                .iter()
                .map(|name| session.team(name))
                .collect::<Result<_>>()?
        };

        let cancel = CancelFlag::new();
        let extractor = session.extractor()?.with_cancel(cancel.clone());
        let runner = BatchRunner::new(&extractor, session.config.extraction.workers, cancel);
        let report = runner.run(&teams)?;

        if let Some(path) = output {
            std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
            println!("Wrote {} team reports to {}", report.teams.len(), path);
        }

        if let OutputFormat::Json = format {
            if output.is_none() {
                return print_json(&report);
            }
            return Ok(());
        }

        println!("{:<28} {:<8} {:<6} {:<7} {}", "Team", "Record", "Games", "Roster", "Failures");
        println!("{}", "─".repeat(70));
        for team in &report.teams {
            let record = team
                .history
                .as_ref()
                .and_then(|h| h.record.as_ref())
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string());
            let games = team.history.as_ref().map(|h| h.games.len()).unwrap_or(0);
            let players = team.roster.as_ref().map(|r| r.players.len()).unwrap_or(0);
            let failures: Vec<String> = team
                .failures
                .iter()
                .map(|f| format!("{}: {}", f.stage, f.message))
                .collect();
            println!(
                "{:<28} {:<8} {:<6} {:<7} {}",
                team.team.display_name,
                record,
                games,
                players,
                if team.cancelled {
                    "cancelled".to_string()
                } else {
                    failures.join("; ")
                }
            );
        }

        Ok(())
    }
}
