use anyhow::Result;
use chrono::NaiveDateTime;
use effectiva_core::time::local_now;
use effectiva_core::{
    AgentProfile, ChatTurn, Coordinator, IntentClassifier, MemorySink, Workspace, context_stats, optimize_history,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::warn;

use crate::config::Config;
use crate::state::{Paths, save_workspace};

/// Answers a routed message with the agent's system prompt and the history.
pub type Delegate<'a> = &'a dyn Fn(&str, &[ChatTurn]) -> Result<String>;

struct ChatLog {
    path: PathBuf,
}

impl ChatLog {
    fn open_today(paths: &Paths, now: NaiveDateTime) -> Result<Self> {
        let dir = paths.home().join("chat");
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{}.md", now.format("%Y-%m-%d")));
        Ok(Self { path })
    }

    fn append(&mut self, role: &str, msg: &str, now: NaiveDateTime) -> Result<()> {
        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(
            f,
            "- {} [{}] {}",
            now.format("%Y-%m-%dT%H:%M:%S"),
            role,
            msg.replace('\n', " ")
        )?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Window {
    pub max_tokens: usize,
    pub keep_last: usize,
}

impl From<&Config> for Window {
    fn from(cfg: &Config) -> Self {
        Self {
            max_tokens: cfg.context.max_tokens,
            keep_last: cfg.context.keep_last,
        }
    }
}

#[derive(Debug, PartialEq)]
enum Slash {
    Quit,
    Reply(String),
}

const HELP: &str = "Commands: /help /mode [name [focus]] /stats /recent /quit";

/// `None` when the line is a message rather than a command.
fn slash(line: &str, ws: &mut Workspace, window: Window, now: NaiveDateTime) -> Option<Slash> {
    let rest = line.strip_prefix('/')?;
    let mut parts = rest.split_whitespace();
    let cmd = parts.next().unwrap_or("");
    let out = match cmd {
        "quit" | "exit" | "q" => Slash::Quit,
        "help" | "?" => Slash::Reply(HELP.to_string()),
        "mode" => match parts.next() {
            None => Slash::Reply(ws.context.render_current()),
            Some(mode) => {
                let focus: Vec<&str> = parts.collect();
                let focus = if focus.is_empty() { None } else { Some(focus.join(" ")) };
                match ws.context.switch(mode, focus.as_deref(), now) {
                    Ok(msg) => Slash::Reply(msg),
                    Err(e) => Slash::Reply(e.to_string()),
                }
            }
        },
        "stats" => {
            let s = context_stats(&ws.history, window.max_tokens);
            Slash::Reply(format!(
                "{} messages, ~{} tokens ({}% of {})",
                s.message_count, s.estimated_tokens, s.utilization_percent, window.max_tokens
            ))
        }
        "recent" => Slash::Reply(ws.captures.render_recent(5)),
        other => Slash::Reply(format!("Unknown command /{other}. {HELP}")),
    };
    Some(out)
}

/// One user message through the coordinator, delegating when no planner applies.
pub fn respond<C: IntentClassifier>(
    coordinator: &Coordinator<C>,
    delegate: Option<Delegate<'_>>,
    ws: &mut Workspace,
    message: &str,
    window: Window,
    now: NaiveDateTime,
    sink: &mut dyn MemorySink,
) -> String {
    ws.history.push(ChatTurn::user(message));
    let reply = coordinator.handle(message, ws, now, sink);

    let text = match reply.text() {
        Some(t) => t,
        None => {
            let profile = AgentProfile::for_kind(reply.route.agent);
            match delegate {
                Some(call) => match call(&profile.system_prompt, &ws.history) {
                    Ok(t) if !t.is_empty() => t,
                    Ok(_) => format!("({} had nothing to add.)", profile.name),
                    Err(e) => {
                        warn!(agent = profile.name, error = %e, "delegated reply failed");
                        format!("({} is unreachable right now: {e})", profile.name)
                    }
                },
                None => format!(
                    "Routed to {} ({}). Configure [llm] in config.toml for a full answer.",
                    profile.name, reply.route.reason
                ),
            }
        }
    };

    ws.history.push(ChatTurn::assistant(text.clone()));
    ws.history = optimize_history(&ws.history, window.max_tokens, window.keep_last);
    text
}

pub fn run_chat<C: IntentClassifier>(
    paths: &Paths,
    cfg: &Config,
    coordinator: &Coordinator<C>,
    delegate: Option<Delegate<'_>>,
    ws: &mut Workspace,
    sink: &mut dyn MemorySink,
) -> Result<()> {
    let window = Window::from(cfg);
    let tz = cfg.profile.timezone.as_str();
    let mut log = ChatLog::open_today(paths, local_now(tz)?)?;
    log.append("system", "session_start", local_now(tz)?)?;

    println!("Effectiva chat. {HELP}");
    println!("Mode: {}\n", ws.context.mode().title());

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush().ok();
        let Some(line) = lines.next() else { break };
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let now = local_now(tz)?;

        match slash(line, ws, window, now) {
            Some(Slash::Quit) => break,
            Some(Slash::Reply(msg)) => println!("{msg}\n"),
            None => {
                log.append("user", line, now)?;
                let text = respond(coordinator, delegate, ws, line, window, now, sink);
                log.append("assistant", &text, now)?;
                println!("{text}\n");
            }
        }
        save_workspace(paths, ws)?;
    }

    log.append("system", "session_end", local_now(tz)?)?;
    save_workspace(paths, ws)
}

#[cfg(test)]
mod tests {
    use super::*;
    use effectiva_core::time::parse_iso;
    use effectiva_core::{ContextMode, HeuristicClassifier, InMemorySink, Role};

    fn now() -> NaiveDateTime {
        parse_iso("2026-03-02T19:00").unwrap()
    }

    fn window() -> Window {
        Window {
            max_tokens: 2048,
            keep_last: 5,
        }
    }

    #[test]
    fn test_slash_commands() {
        let mut ws = Workspace::new(now());
        assert_eq!(slash("hello", &mut ws, window(), now()), None);
        assert_eq!(slash("/quit", &mut ws, window(), now()), Some(Slash::Quit));

        let Some(Slash::Reply(_)) = slash("/mode work client deck", &mut ws, window(), now()) else {
            panic!("expected a reply");
        };
        assert_eq!(ws.context.mode(), ContextMode::Work);

        let Some(Slash::Reply(msg)) = slash("/frobnicate", &mut ws, window(), now()) else {
            panic!("expected a reply");
        };
        assert!(msg.contains("Unknown command"));
    }

    #[test]
    fn test_planner_reply_skips_delegate() {
        let mut ws = Workspace::new(now());
        let mut sink = InMemorySink::new();
        let coordinator = Coordinator::new(HeuristicClassifier);
        let never = |_: &str, _: &[ChatTurn]| -> Result<String> { panic!("delegate should not run") };

        let text = respond(&coordinator, Some(&never), &mut ws, "plan my day", window(), now(), &mut sink);
        assert!(!text.is_empty());
        assert_eq!(ws.history.len(), 2);
        assert_eq!(ws.history[1].role, Role::Assistant);
    }

    #[test]
    fn test_delegate_gets_agent_prompt_and_history() {
        let mut ws = Workspace::new(now());
        let mut sink = InMemorySink::new();
        let coordinator = Coordinator::new(HeuristicClassifier);
        let echo = |system: &str, turns: &[ChatTurn]| -> Result<String> {
            assert!(system.contains("<agent_profile>"));
            Ok(format!("seen {} turns", turns.len()))
        };

        let text = respond(&coordinator, Some(&echo), &mut ws, "my office shift moved", window(), now(), &mut sink);
        assert_eq!(text, "seen 1 turns");
    }

    #[test]
    fn test_offline_delegate_names_agent() {
        let mut ws = Workspace::new(now());
        let mut sink = InMemorySink::new();
        let coordinator = Coordinator::new(HeuristicClassifier);
        let text = respond(&coordinator, None, &mut ws, "help with cooking for the family", window(), now(), &mut sink);
        assert!(text.starts_with("Routed to"));
    }
}
