//! Interactive session command
//!
//! Reads one command per line from stdin and drives a `Session`: paging
//! through the report, editing the simulator, planning goals and exporting.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use vitals_core::{
    AppMode, BudgetField, Config, GoalDraft, ReportWizard, ScoringBackend, Session,
    SimulationController, WizardPage,
};

use super::core::{make_client, read_household, read_report};
use super::goals::{parse_priority, render_goal_analysis};
use super::simulate::wait_for_result;
use crate::render::{render_goals, render_page, render_snapshot, ChartCapture, TerminalViewport};

/// Whether the session loop should keep reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

const HELP: &str = "\
Commands:
  score <file>                    Score a household budget file
  resume <file>                   Open a saved report without scoring
  next | back                     Move between pages
  set <Field> <value>             Edit the simulator (Actions page)
  sim                             Wait for and show the simulated score
  reset-sim                       Restore the original budget in the simulator
  goal <name> <amount> <months> [priority]
                                  Check a savings goal
  add-goal                        Add the last analyzed goal
  remove-goal <n>                 Remove goal number n
  goals                           List goals
  export [dir]                    Export the current page to PDF
  reset                           Discard the report
  home                            Back to the landing screen
  help | quit";

pub async fn cmd_session(config: &Config, input: Option<&Path>, report: Option<&Path>) -> Result<()> {
    let client = make_client(config)?;
    let mut session = Session::new(client, config, Arc::new(TerminalViewport));
    session.start_analysis();
    let wait_limit = config.simulation.debounce + config.service.request_timeout;

    if let Some(path) = input {
        let household = read_household(path)?;
        // Failure leaves a warning on the session
        let _ = session.submit(household).await;
    } else if let Some(path) = report {
        session.resume(&read_report(path)?);
    }
    show(&session);
    println!("Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("vitals> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match execute(&mut session, &line, wait_limit).await {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => {}
            Err(e) => println!("❌ {:#}", e),
        }
    }

    Ok(())
}

/// Run one session command line
pub async fn execute<B: ScoringBackend + Clone + 'static>(
    session: &mut Session<B>,
    line: &str,
    wait_limit: Duration,
) -> Result<Flow> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(Flow::Continue);
    };
    let args: Vec<&str> = words.collect();
    debug!(command, ?args, "Session command");

    match command {
        "quit" | "exit" | "q" => return Ok(Flow::Quit),
        "help" | "?" => println!("{}", HELP),
        "score" => {
            let path = arg(&args, 0, "score <file>")?;
            let household = read_household(Path::new(path))?;
            // A failed submission keeps the old report and sets a warning
            let _ = session.submit(household).await;
            show(session);
        }
        "resume" => {
            let path = arg(&args, 0, "resume <file>")?;
            session.resume(&read_report(Path::new(path))?);
            show(session);
        }
        "next" => {
            wizard(session)?.next();
            show(session);
        }
        "back" => {
            wizard(session)?.back();
            show(session);
        }
        "set" => {
            let usage = "set <Field> <value>";
            let field: BudgetField = arg(&args, 0, usage)?
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;
            let value = arg(&args, 1, usage)?;
            let sim = simulator(session)?;
            sim.set_field_str(field.as_str(), value)
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            let snapshot = sim.snapshot();
            println!(
                "   {} = {:.2} (surplus change ${})",
                field.label(),
                snapshot.values.get(field),
                super::signed(snapshot.surplus_delta, 0)
            );
        }
        "sim" => {
            let snapshot = wait_for_result(simulator(session)?, wait_limit).await?;
            print!("{}", render_snapshot(&snapshot));
        }
        "reset-sim" => {
            simulator(session)?.reset();
            println!("↩️  Simulator restored to the original budget");
        }
        "goal" => {
            let usage = "goal <name> <amount> <months> [priority]";
            let draft = GoalDraft::new(
                arg(&args, 0, usage)?,
                arg(&args, 1, usage)?,
                arg(&args, 2, usage)?,
                parse_priority(args.get(3).copied().unwrap_or("medium"))?,
            );
            let wizard = existing_wizard(session)?;
            match wizard.goals().analyze(&draft, wizard.household()).await {
                Ok(analysis) => {
                    print!("{}", render_goal_analysis(&analysis));
                    println!("   Use 'add-goal' to keep it");
                }
                Err(_) => {
                    if let Some(message) = wizard.goals().error() {
                        println!("⚠️  {}", message);
                    }
                }
            }
        }
        "add-goal" => {
            if existing_wizard(session)?.goals().accept_pending() {
                print!("{}", render_goals(existing_wizard(session)?.goals()));
            } else {
                println!("No analyzed goal to add; run 'goal' first");
            }
        }
        "remove-goal" => {
            let n: usize = arg(&args, 0, "remove-goal <n>")?
                .parse()
                .context("Goal number must be a whole number")?;
            let goals = existing_wizard(session)?.goals();
            match n.checked_sub(1).and_then(|i| goals.remove_goal(i)) {
                Some(removed) => println!("🗑️  Removed {}", removed.goal().goal_name),
                None => println!("No goal number {}", n),
            }
        }
        "goals" => print!("{}", render_goals(existing_wizard(session)?.goals())),
        "export" => {
            let dir = PathBuf::from(args.first().copied().unwrap_or("."));
            match session.export_report(&ChartCapture, &dir).await {
                Ok(path) => println!("📄 Exported to {}", path.display()),
                Err(_) => {
                    if let Some(notice) = session.notice() {
                        println!("⚠️  {}", notice);
                    }
                }
            }
        }
        "reset" => {
            session.reset_report();
            println!("Report discarded. Use 'score <file>' to start again.");
        }
        "home" => {
            session.back_to_home();
            println!("🏠 Back to the landing screen. Use 'score <file>' to start an analysis.");
        }
        other => anyhow::bail!("Unknown command: {}. Type 'help' for commands.", other),
    }

    Ok(Flow::Continue)
}

fn arg<'a>(args: &[&'a str], index: usize, usage: &str) -> Result<&'a str> {
    args.get(index)
        .copied()
        .with_context(|| format!("Usage: {}", usage))
}

fn wizard<B: ScoringBackend + Clone + 'static>(
    session: &mut Session<B>,
) -> Result<&mut ReportWizard<B>> {
    session
        .wizard_mut()
        .context("No report open; use 'score <file>' or 'resume <file>'")
}

fn existing_wizard<B: ScoringBackend + Clone + 'static>(
    session: &Session<B>,
) -> Result<&ReportWizard<B>> {
    session
        .wizard()
        .context("No report open; use 'score <file>' or 'resume <file>'")
}

fn simulator<B: ScoringBackend + Clone + 'static>(
    session: &Session<B>,
) -> Result<&SimulationController<B>> {
    let wizard = existing_wizard(session)?;
    if wizard.page() != WizardPage::Actions {
        anyhow::bail!("The simulator is on the Actions page; use 'next' to get there");
    }
    wizard
        .simulation()
        .context("The simulator is on the Actions page; use 'next' to get there")
}

fn show<B: ScoringBackend + Clone + 'static>(session: &Session<B>) {
    if let Some(warning) = session.warning() {
        println!("⚠️  {}", warning);
    }
    match (session.mode(), session.wizard()) {
        (AppMode::Landing, _) => println!("🏠 Landing. Use 'score <file>' to start an analysis."),
        (AppMode::Dashboard, None) => println!("Enter a budget with 'score <file>'."),
        (AppMode::Dashboard, Some(wizard)) => print!("{}", render_page(wizard)),
    }
}
