//! Terminal chat loop.

use anyhow::{Context, Result};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::{Path, PathBuf};

use crate::services::session::Session;

const PROMPT: &str = "👤 You: ";
const RULE_WIDTH: usize = 64;

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Empty,
    Exit,
    Help,
    /// `load` without a path carries `None`
    Load(Option<PathBuf>),
    Ask(String),
}

pub fn parse_command(line: &str) -> Command {
    let input = line.trim();
    if input.is_empty() {
        return Command::Empty;
    }

    let lower = input.to_lowercase();
    match lower.as_str() {
        "exit" | "quit" | "bye" | "goodbye" => return Command::Exit,
        "help" => return Command::Help,
        "load" => return Command::Load(None),
        _ => {}
    }

    if lower.starts_with("load ") {
        let path = input[5..].trim();
        return Command::Load((!path.is_empty()).then(|| PathBuf::from(path)));
    }
    Command::Ask(input.to_string())
}

fn print_welcome() {
    println!("🤓{}🤓", "=".repeat(RULE_WIDTH - 4));
    println!("{}", "     🎉 WELCOME TO ANDY THE ANALYST! 🎉".bright_magenta().bold());
    println!("{}", "=".repeat(RULE_WIDTH));
    println!("👋 Hey there! I'm Andy, your friendly neighborhood data analyst!");
    println!("I'm absolutely obsessed with spreadsheets, charts, and finding");
    println!("amazing insights in your data! 📊✨");
    println!();
    println!("💡 COMMANDS:");
    println!("  • 'load <filepath>' - Load a CSV or Excel file for analysis");
    println!("  • 'help' - Show available commands");
    println!("  • 'exit' - Say goodbye (I'll miss you! 😢)");
    println!("  • Ask me anything about your data once loaded!");
    println!();
    println!("🚀 Let's dive into some data magic together!");
    println!("{}", "=".repeat(RULE_WIDTH));
}

fn print_help() {
    println!("\n📋 ANDY'S HELP MENU:");
    println!("{}", "=".repeat(40));
    println!("🔸 load <filepath>     - Load a CSV or Excel file");
    println!("                       Example: load data.csv");
    println!("🔸 help               - Show this help menu");
    println!("🔸 exit               - End our session");
    println!("🔸 <question>         - Ask me anything about your data!");
    println!();
    println!("💡 Example questions:");
    println!("   • 'Analyze my spending patterns'");
    println!("   • 'Create a chart showing trends over time'");
    println!("   • 'What are the top categories by amount?'");
    println!("   • 'Show me any interesting insights!'");
    println!("{}", "=".repeat(40));
}

fn print_farewell() {
    println!("\n🤓 Andy: Thanks for letting me analyze with you!");
    println!("📊 Remember, there's always more insights to discover!");
    println!("👋 See you next time! Keep those spreadsheets organized! ✨");
}

fn load(session: &mut Session, path: &Path) {
    println!("\n🔄 Loading data from: {}", path.display());
    match session.load(path) {
        Ok(summary) => {
            println!(
                "{}",
                format!(
                    "✅ Data loaded successfully! Shape: ({}, {})",
                    summary.row_count, summary.column_count
                )
                .green()
            );
            let columns: Vec<&str> = summary.columns.iter().map(|c| c.name.as_str()).collect();
            println!("📊 Columns: {}", columns.join(", "));
            println!("\n🤓 Andy: Fantastic! I've got your data loaded and ready to go!");
            println!("🎯 Ask me anything - I'm excited to dig into this dataset!");
        }
        Err(e) => println!("{}", format!("❌ Error loading data: {}", e).red()),
    }
}

/// Run the chat loop until the user leaves
pub async fn run(mut session: Session, initial_file: Option<PathBuf>) -> Result<()> {
    let mut rl = DefaultEditor::new().context("Failed to start line editor")?;
    print_welcome();

    if let Some(path) = initial_file {
        load(&mut session, &path);
    }
    println!("\n🤔 How can I help you today?");

    loop {
        match rl.readline(&format!("\n{}", PROMPT)) {
            Ok(line) => {
                let command = parse_command(&line);
                if command != Command::Empty {
                    let _ = rl.add_history_entry(line.trim());
                }

                match command {
                    Command::Empty => continue,
                    Command::Exit => {
                        print_farewell();
                        break;
                    }
                    Command::Help => print_help(),
                    Command::Load(None) => {
                        println!("❌ Please specify a file path. Example: load data.csv")
                    }
                    Command::Load(Some(path)) => load(&mut session, &path),
                    Command::Ask(question) => {
                        println!("\n🤓 Andy: Let me analyze that for you...");
                        let reply = session.ask(&question).await;
                        println!("\n{} {}", "🤓 Andy:".cyan().bold(), reply.text);
                        for chart in &reply.charts {
                            println!("{}", format!("📊 Chart saved: {}", chart.display()).bright_black());
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("\n\n🤓 Andy: Caught you trying to escape! 😄");
                println!("👋 Thanks for the analysis session. Until next time!");
                break;
            }
            Err(ReadlineError::Eof) => {
                print_farewell();
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("🚨 Unexpected error: {}", err).red());
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_words_are_case_insensitive() {
        for word in ["exit", "QUIT", " Bye ", "GoodBye"] {
            assert_eq!(parse_command(word), Command::Exit);
        }
    }

    #[test]
    fn load_keeps_path_case() {
        assert_eq!(
            parse_command("LOAD Data/Sales Q1.csv"),
            Command::Load(Some(PathBuf::from("Data/Sales Q1.csv")))
        );
        assert_eq!(parse_command("load   "), Command::Load(None));
    }

    #[test]
    fn blank_and_questions() {
        assert_eq!(parse_command("   "), Command::Empty);
        assert_eq!(parse_command("help"), Command::Help);
        assert_eq!(
            parse_command("What are the top categories?"),
            Command::Ask("What are the top categories?".to_string())
        );
        assert_eq!(
            parse_command("loader stats please"),
            Command::Ask("loader stats please".to_string())
        );
    }
}
