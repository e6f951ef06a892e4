use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use effectiva_core::day_planner::Location;
use effectiva_core::extract::extract_day;
use effectiva_core::time::{local_now, parse_date};
use effectiva_core::{
    CaptureLog, ChatTurn, Coordinator, CrisisParams, DayRequest, DeadlineTask, EnergyLevel, EnergyTask, Importance,
    NewEvent, StressLevel, TaskFilter, TaskStatus, handle_crisis, plan_catchup, plan_day, prioritize, prioritizer,
    route_message, schedule_by_energy, store, study, time_management,
};
use tracing_subscriber::EnvFilter;

mod chat;
mod config;
mod llm;
mod memory_file;
mod setup;
mod state;

use config::Config;
use llm::{Classifier, LlmClient};
use memory_file::FileSink;
use state::Paths;

#[derive(Parser, Debug)]
#[command(
    name = "effectiva",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("EFFECTIVA_BUILD_SHA"), ")"),
    about = "Planning help for students juggling college, work and home"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// One-time interactive setup: capture your student profile
    Setup,

    /// Turn a free-text "I'm behind" message into a catch-up block
    Crisis {
        message: String,
        #[arg(long)]
        location: Option<String>,
        #[arg(long, default_value_t = effectiva_core::crisis::DEFAULT_CRISIS_HOURS)]
        hours: f64,
    },

    /// Build a catch-up block from explicit numbers
    Catchup {
        #[arg(long, default_value_t = 5)]
        days_missed: u32,
        #[arg(long, default_value_t = 0)]
        labs_missed: u32,
        #[arg(long, default_value_t = 1)]
        assignments: u32,
        #[arg(long)]
        exam_in: Option<u32>,
        /// low, medium, high or overwhelmed
        #[arg(long)]
        stress: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long, default_value_t = effectiva_core::crisis::DEFAULT_CRISIS_HOURS)]
        hours: f64,
    },

    /// Plan today's study blocks, from a message or from flags
    PlanDay {
        #[arg(long)]
        message: Option<String>,
        /// home or college (default from config)
        #[arg(long)]
        location: Option<String>,
        #[arg(long, default_value_t = 6.0)]
        hours: f64,
        #[arg(long, default_value_t = 0)]
        assignments: u32,
        #[arg(long, default_value_t = 0)]
        labs: u32,
        #[arg(long)]
        projects: bool,
        #[arg(long)]
        exam_in: Option<u32>,
    },

    /// Rank tasks by deadline and importance
    Prioritize {
        /// name@deadline@importance, e.g. "DBMS sheet@2026-03-04T09:00@high"
        #[arg(long = "task", required = true)]
        tasks: Vec<String>,
    },

    /// Fit tasks into the hours you have, ordered for your energy
    Schedule {
        /// name:difficulty:minutes, e.g. "OS notes:hard:60"
        #[arg(long = "task", required = true)]
        tasks: Vec<String>,
        #[arg(long, default_value_t = 3.0)]
        hours: f64,
        /// low, medium or high (default: latest energy check)
        #[arg(long)]
        energy: Option<String>,
    },

    /// Show the intent and routing for a message
    Classify { message: String },

    /// Quick capture of a task, note or reminder; `capture recent` lists captures
    Capture {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Task store
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },

    /// Calendar events
    Event {
        #[command(subcommand)]
        command: EventCommand,
    },

    /// Study / work / life / balanced context modes
    Mode {
        #[command(subcommand)]
        command: ModeCommand,
    },

    /// Study techniques
    Study {
        #[command(subcommand)]
        command: StudyCommand,
    },

    /// Time blocks, Pomodoro schedules and timing advice
    Time {
        #[command(subcommand)]
        command: TimeCommand,
    },

    /// Chat with the coordinator
    Chat,

    /// Configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum TaskCommand {
    Create {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "medium")]
        priority: String,
        #[arg(long, default_value = "general")]
        category: String,
        #[arg(long)]
        deadline: Option<String>,
    },
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        priority: Option<String>,
    },
    Complete {
        id: String,
    },
    Priority {
        id: String,
        priority: String,
    },
    Delete {
        id: String,
    },
    Urgent,
}

#[derive(Subcommand, Debug)]
enum EventCommand {
    Add {
        title: String,
        /// YYYY-MM-DDTHH:MM
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long, default_value = "general")]
        category: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        location: String,
    },
    List {
        /// YYYY-MM-DD (default today)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    Free {
        #[arg(long)]
        date: Option<String>,
        #[arg(long, default_value_t = 30)]
        min_minutes: u32,
    },
    Delete {
        id: String,
    },
    Upcoming {
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
}

#[derive(Subcommand, Debug)]
enum ModeCommand {
    Switch {
        mode: String,
        #[arg(long)]
        focus: Option<String>,
    },
    Show,
    Suggest,
    History {
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Set a preference, or list them when no key is given
    Pref {
        key: Option<String>,
        value: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum StudyCommand {
    Spaced {
        topic: String,
        #[arg(long, default_value_t = 5)]
        sessions: u32,
        /// leitner, sm2, fibonacci or exponential
        #[arg(long, default_value = "leitner")]
        algorithm: String,
    },
    Recall {
        topic: String,
        #[arg(long, default_value = "medium")]
        difficulty: String,
        #[arg(long, default_value_t = 5)]
        count: usize,
    },
    Technique {
        #[arg(long, default_value = "understanding")]
        goal: String,
        #[arg(long, default_value_t = 60)]
        minutes: u32,
        #[arg(long, default_value = "intermediate")]
        level: String,
    },
}

#[derive(Subcommand, Debug)]
enum TimeCommand {
    Block {
        activity: String,
        #[arg(long, default_value_t = 60)]
        minutes: u32,
        #[arg(long)]
        preferred: Option<String>,
        #[arg(long, default_value = "medium")]
        priority: String,
    },
    Pomodoro {
        #[arg(required = true, num_args = 1..)]
        subjects: Vec<String>,
        #[arg(long, default_value_t = 3)]
        hours: u32,
        #[arg(long, default_value_t = time_management::TASK_BREAK_MINUTES)]
        break_minutes: u32,
    },
    Needed {
        /// name:difficulty:minutes
        #[arg(long = "task", required = true)]
        tasks: Vec<String>,
        #[arg(long)]
        no_breaks: bool,
    },
    Breaks {
        #[arg(long, default_value_t = 4)]
        hours: u32,
    },
    Optimal {
        task_type: String,
        #[arg(long, default_value_t = 60)]
        minutes: u32,
        #[arg(long)]
        energy: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config.toml if none exists
    Init,
}

fn init_tracing(cfg: &Config) {
    let filter = EnvFilter::try_from_env("EFFECTIVA_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .or_else(|_| EnvFilter::try_new(&cfg.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

fn importance(s: &str) -> Result<Importance> {
    Importance::parse(s).ok_or_else(|| anyhow!("unknown priority {s:?}; use low, medium, high or urgent"))
}

fn energy(s: Option<&str>) -> Result<Option<EnergyLevel>> {
    s.map(|s| EnergyLevel::parse(s).ok_or_else(|| anyhow!("unknown energy level {s:?}; use low, medium or high")))
        .transpose()
}

fn date_or_today(s: Option<&str>, now: NaiveDateTime) -> Result<chrono::NaiveDate> {
    match s {
        Some(s) => parse_date(s).ok_or_else(|| anyhow!("bad date {s:?}; expected YYYY-MM-DD")),
        None => Ok(now.date()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = Paths::resolve()?;
    let cfg = config::load_config(&paths)?;
    init_tracing(&cfg);

    let now = local_now(&cfg.profile.timezone)
        .with_context(|| format!("resolve timezone {:?}", cfg.profile.timezone))?;
    let mut sink = FileSink::open(paths.memory_dir())?;

    match cli.command {
        Command::Setup => setup::run_setup(&paths, &mut sink)?,

        Command::Crisis { message, location, hours } => {
            let location = location.unwrap_or_else(|| cfg.profile.location.clone());
            let plan = handle_crisis(&message, Some(location.as_str()), hours, now, &mut sink);
            println!("{plan}");
        }

        Command::Catchup {
            days_missed,
            labs_missed,
            assignments,
            exam_in,
            stress,
            location,
            hours,
        } => {
            let stress_level = match stress.as_deref() {
                Some(s) => Some(StressLevel::parse(s).ok_or_else(|| anyhow!("unknown stress level {s:?}"))?),
                None => None,
            };
            let params = CrisisParams {
                days_missed,
                labs_missed,
                assignments_pending: assignments,
                upcoming_exam_in_days: exam_in,
                stress_level,
            };
            let location = location.unwrap_or_else(|| cfg.profile.location.clone());
            let plan = plan_catchup(&params, Some(location.as_str()), hours, now, &mut sink);
            println!("{plan}");
        }

        Command::PlanDay {
            message,
            location,
            hours,
            assignments,
            labs,
            projects,
            exam_in,
        } => {
            let location = Location::normalize(location.as_deref().unwrap_or(&cfg.profile.location));
            let req = match message {
                Some(m) => extract_day(&m, location),
                None => DayRequest {
                    location,
                    available_hours: hours,
                    assignments_pending: assignments,
                    labs_today: labs,
                    projects_active: projects,
                    upcoming_exam_in_days: exam_in,
                },
            };
            println!("{}", plan_day(&req, &mut sink));
        }

        Command::Prioritize { tasks } => {
            let tasks: Vec<DeadlineTask> = tasks.iter().map(|s| DeadlineTask::parse_spec(s)).collect();
            println!("{}", prioritizer::render(&prioritize(&tasks, now)));
        }

        Command::Schedule { tasks, hours, energy: level } => {
            let tasks: Vec<EnergyTask> = tasks.iter().map(|s| EnergyTask::parse_spec(s)).collect();
            let level = match energy(level.as_deref())? {
                Some(l) => Some(l),
                None => state::load_workspace(&paths, now)?.captures.current_energy(),
            };
            println!("{}", schedule_by_energy(&tasks, level, hours, now));
        }

        Command::Classify { message } => {
            let ws = state::load_workspace(&paths, now)?;
            let coordinator = Coordinator::new(Classifier::from_config(&cfg));
            let prediction = coordinator.classify(&message);
            let route = route_message(&prediction, ws.context.mode());
            println!("{}", prediction.to_json());
            println!("-> {} ({:?}): {}", route.agent, route.confidence, route.reason);
        }

        Command::Capture { text } => {
            let mut ws = state::load_workspace(&paths, now)?;
            let out = capture(&mut ws.captures, &text.join(" "), now);
            println!("{out}");
            state::save_workspace(&paths, &ws)?;
        }

        Command::Task { command } => {
            let mut ws = state::load_workspace(&paths, now)?;
            println!("{}", task_cmd(&mut ws.tasks, command, now)?);
            state::save_workspace(&paths, &ws)?;
        }

        Command::Event { command } => {
            let mut ws = state::load_workspace(&paths, now)?;
            println!("{}", event_cmd(&mut ws.events, command, now)?);
            state::save_workspace(&paths, &ws)?;
        }

        Command::Mode { command } => {
            let mut ws = state::load_workspace(&paths, now)?;
            let ctx = &mut ws.context;
            let out = match command {
                ModeCommand::Switch { mode, focus } => ctx.switch(&mode, focus.as_deref(), now)?,
                ModeCommand::Show => ctx.render_current(),
                ModeCommand::Suggest => ctx.render_suggestions(),
                ModeCommand::History { limit } => ctx.render_history(limit),
                ModeCommand::Pref { key: Some(k), value: Some(v) } => ctx.set_preference(&k, &v),
                ModeCommand::Pref { key: Some(k), value: None } => match ctx.preferences().get(&k) {
                    Some(v) => format!("{k} = {v}"),
                    None => format!("No preference named {k:?}."),
                },
                ModeCommand::Pref { key: None, .. } => ctx.render_preferences(),
            };
            println!("{out}");
            state::save_workspace(&paths, &ws)?;
        }

        Command::Study { command } => println!("{}", study_cmd(command, now)),

        Command::Time { command } => {
            let out = match command {
                TimeCommand::Block {
                    activity,
                    minutes,
                    preferred,
                    priority,
                } => time_management::time_block(&activity, minutes, preferred.as_deref(), importance(&priority)?),
                TimeCommand::Pomodoro {
                    subjects,
                    hours,
                    break_minutes,
                } => match time_management::study_schedule(&subjects, hours, break_minutes, now) {
                    Some(s) => s.render(),
                    None => bail!("no Pomodoro session fits in {hours}h with {break_minutes} minute breaks"),
                },
                TimeCommand::Needed { tasks, no_breaks } => {
                    let tasks: Vec<EnergyTask> = tasks.iter().map(|s| EnergyTask::parse_spec(s)).collect();
                    let estimate = time_management::time_needed(&tasks, !no_breaks);
                    time_management::render_time_needed(&tasks, estimate, !no_breaks)
                }
                TimeCommand::Breaks { hours } => time_management::break_schedule(hours),
                TimeCommand::Optimal {
                    task_type,
                    minutes,
                    energy: level,
                } => time_management::optimal_time(&task_type, energy(level.as_deref())?, minutes, now),
            };
            println!("{out}");
        }

        Command::Chat => {
            let mut ws = state::load_workspace(&paths, now)?;
            let coordinator = Coordinator::new(Classifier::from_config(&cfg))
                .with_location(cfg.profile.location.clone());
            let client = match LlmClient::from_config(&cfg.llm) {
                Ok(c) => Some(c),
                Err(e) => {
                    eprintln!("LLM replies disabled: {e:#}");
                    None
                }
            };
            let call = |system: &str, turns: &[ChatTurn]| -> Result<String> {
                match &client {
                    Some(c) => c.chat(system, turns),
                    None => bail!("no LLM configured"),
                }
            };
            let delegate: Option<chat::Delegate<'_>> = if client.is_some() { Some(&call) } else { None };
            chat::run_chat(&paths, &cfg, &coordinator, delegate, &mut ws, &mut sink)?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config(&paths)?,
        },
    }

    Ok(())
}

fn capture(log: &mut CaptureLog, text: &str, now: NaiveDateTime) -> String {
    match text.trim() {
        "recent" => log.render_recent(10),
        t => log.process_natural(t, now),
    }
}

fn task_cmd(tasks: &mut effectiva_core::TaskStore, command: TaskCommand, now: NaiveDateTime) -> Result<String> {
    let out = match command {
        TaskCommand::Create {
            title,
            description,
            priority,
            category,
            deadline,
        } => {
            let t = tasks.create(&title, &description, importance(&priority)?, &category, deadline.as_deref(), now);
            format!("✓ Task created: {} (ID: {})", t.title, t.id)
        }
        TaskCommand::List {
            status,
            category,
            priority,
        } => {
            let filter = TaskFilter {
                status: status
                    .as_deref()
                    .map(|s| TaskStatus::parse(s).ok_or_else(|| anyhow!("unknown status {s:?}")))
                    .transpose()?,
                category,
                priority: priority.as_deref().map(importance).transpose()?,
            };
            store::render_tasks(&tasks.list(&filter))
        }
        TaskCommand::Complete { id } => {
            let t = tasks.complete(&id, now)?;
            format!("✓ Task completed: {}", t.title)
        }
        TaskCommand::Priority { id, priority } => {
            let p = importance(&priority)?;
            let old = tasks.update_priority(&id, p)?;
            format!("✓ Priority updated: {} -> {}", old.as_str(), p.as_str())
        }
        TaskCommand::Delete { id } => {
            let t = tasks.delete(&id)?;
            format!("✓ Task deleted: {}", t.title)
        }
        TaskCommand::Urgent => store::render_urgent(&tasks.urgent()),
    };
    Ok(out)
}

fn event_cmd(events: &mut effectiva_core::EventStore, command: EventCommand, now: NaiveDateTime) -> Result<String> {
    let out = match command {
        EventCommand::Add {
            title,
            start,
            end,
            category,
            description,
            location,
        } => {
            let new = NewEvent {
                title: &title,
                start: &start,
                end: &end,
                category: &category,
                description: &description,
                location: &location,
            };
            let e = events.add(new, now)?;
            format!("✓ Event added: {} (ID: {})", e.title, e.id)
        }
        EventCommand::List { date, category } => {
            let date = date_or_today(date.as_deref(), now)?;
            store::render_events(date, &events.events_on(date, category.as_deref()))
        }
        EventCommand::Free { date, min_minutes } => {
            let date = date_or_today(date.as_deref(), now)?;
            store::render_free_slots(date, min_minutes, &events.free_slots(date, min_minutes))
        }
        EventCommand::Delete { id } => {
            let e = events.delete(&id)?;
            format!("✓ Event deleted: {}", e.title)
        }
        EventCommand::Upcoming { days } => store::render_upcoming(days, &events.upcoming(days, now)),
    };
    Ok(out)
}

fn study_cmd(command: StudyCommand, now: NaiveDateTime) -> String {
    match command {
        StudyCommand::Spaced {
            topic,
            sessions,
            algorithm,
        } => {
            let alg = study::Algorithm::parse(&algorithm);
            let plan = study::spaced_schedule(&topic, sessions, alg, now.date());
            study::render_spaced_schedule(&topic, alg, &plan)
        }
        StudyCommand::Recall {
            topic,
            difficulty,
            count,
        } => {
            let d = study::Difficulty::parse(&difficulty);
            study::render_recall_questions(&topic, d, &study::recall_questions(&topic, d, count))
        }
        StudyCommand::Technique { goal, minutes, level } => {
            study::recommend_technique(&goal, minutes, &level).render()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use effectiva_core::time::parse_iso;
    use effectiva_core::{EventStore, TaskStore};

    fn now() -> NaiveDateTime {
        parse_iso("2026-03-02T09:00").unwrap()
    }

    #[test]
    fn test_long_version_carries_build_stamp() {
        use clap::CommandFactory;
        let stamp = env!("EFFECTIVA_BUILD_SHA");
        assert!(!stamp.is_empty());
        let version = Cli::command().render_long_version();
        assert!(version.contains(&format!("({stamp})")));
    }

    #[test]
    fn test_timezones_come_from_core() {
        let manifest = include_str!("../Cargo.toml");
        assert!(!manifest.contains("chrono-tz"));
        assert!(effectiva_core::time::local_now("Asia/Kolkata").is_ok());
    }

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();

        let cli = Cli::try_parse_from([
            "effectiva",
            "schedule",
            "--task",
            "OS notes:hard:60",
            "--task",
            "email:easy:15",
            "--hours",
            "2",
        ])
        .unwrap();
        let Command::Schedule { tasks, hours, .. } = cli.command else {
            panic!("expected schedule");
        };
        assert_eq!(tasks.len(), 2);
        assert_eq!(hours, 2.0);
    }

    #[test]
    fn test_task_commands() {
        let mut store = TaskStore::new();
        let out = task_cmd(
            &mut store,
            TaskCommand::Create {
                title: "DBMS sheet".into(),
                description: String::new(),
                priority: "high".into(),
                category: "study".into(),
                deadline: None,
            },
            now(),
        )
        .unwrap();
        assert!(out.contains("DBMS sheet"));
        let id = store.list(&TaskFilter::default())[0].id.clone();

        assert!(task_cmd(&mut store, TaskCommand::Urgent, now()).unwrap().contains("DBMS sheet"));
        task_cmd(&mut store, TaskCommand::Complete { id: id.clone() }, now()).unwrap();
        assert!(task_cmd(&mut store, TaskCommand::Complete { id: "nope".into() }, now()).is_err());
        assert!(
            task_cmd(
                &mut store,
                TaskCommand::Priority {
                    id,
                    priority: "sometime".into()
                },
                now()
            )
            .is_err()
        );
    }

    #[test]
    fn test_event_commands() {
        let mut events = EventStore::new();
        let out = event_cmd(
            &mut events,
            EventCommand::Add {
                title: "Java viva".into(),
                start: "2026-03-02T10:00".into(),
                end: "2026-03-02T11:00".into(),
                category: "college".into(),
                description: String::new(),
                location: String::new(),
            },
            now(),
        )
        .unwrap();
        assert!(out.contains("Java viva"));
        let listed = event_cmd(
            &mut events,
            EventCommand::List {
                date: None,
                category: None,
            },
            now(),
        )
        .unwrap();
        assert!(listed.contains("Java viva"));
        assert!(
            event_cmd(
                &mut events,
                EventCommand::List {
                    date: Some("March 2".into()),
                    category: None
                },
                now()
            )
            .is_err()
        );
    }

    #[test]
    fn test_capture_recent_and_natural() {
        let mut log = CaptureLog::new();
        assert!(capture(&mut log, "recent", now()).starts_with("No recent captures"));
        capture(&mut log, "todo: submit lab record", now());
        assert_eq!(log.len(), 1);
        assert!(capture(&mut log, "recent", now()).contains("lab record"));
    }
}
