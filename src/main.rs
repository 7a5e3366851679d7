mod dashboard;
mod error;
mod filter;
mod models;
mod session;
mod source;
mod store;
mod taxonomy;
mod tui;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use dashboard::{BreakdownSort, Granularity};
use error::QuizError;
use filter::{FilterCriteria, GroupMode};
use models::{evaluate, AttemptLogEntry, JsonOutput, Question};
use store::{FileBackend, ProgressLog};

const DEFAULT_QUESTIONS_NAME: &str = "questions.json";
const DEFAULT_LOG_NAME: &str = "progress.json";

#[derive(Parser)]
#[command(name = "kakomon")]
#[command(about = "Drill past-exam multiple-choice questions and track your progress")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Path to the question bank (JSON array)
    #[arg(long, global = true)]
    questions: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GroupArg {
    ParentSub,
    Parent,
    Session,
}

impl From<GroupArg> for GroupMode {
    fn from(value: GroupArg) -> Self {
        match value {
            GroupArg::ParentSub => GroupMode::ParentSub,
            GroupArg::Parent => GroupMode::ParentOnly,
            GroupArg::Session => GroupMode::Session,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List questions, optionally filtered
    List {
        /// Match text against id, question and source
        #[arg(long, short)]
        search: Option<String>,

        /// Parent category
        #[arg(long, short)]
        category: Option<String>,

        /// Sub-category (with --category)
        #[arg(long)]
        sub: Option<String>,

        /// Exam session label
        #[arg(long)]
        session: Option<String>,

        /// Only questions never answered
        #[arg(long, short)]
        unanswered: bool,

        /// Only questions whose latest attempt was wrong
        #[arg(long, short)]
        incorrect: bool,

        /// Grouping axis
        #[arg(long, short, value_enum, default_value_t = GroupArg::ParentSub)]
        group: GroupArg,
    },

    /// Show one question with its choices and latest result
    Show {
        /// Question ID
        id: String,
    },

    /// Answer a question
    Answer {
        /// Question ID
        id: String,

        /// Comma-separated choice indices, e.g. 0,2
        #[arg(long, short)]
        choices: String,
    },

    /// Show progress statistics
    Stats {
        /// Break down by parent/sub pair instead of parent only
        #[arg(long)]
        by_sub: bool,

        /// Sort the breakdown by category name instead of accuracy
        #[arg(long)]
        by_name: bool,
    },

    /// List categories with question counts
    Categories,

    /// List exam sessions with question counts
    Sessions,

    /// Launch interactive terminal UI
    Tui,
}

fn data_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kakomon")
}

fn get_questions_path(cli_override: Option<&PathBuf>) -> PathBuf {
    if let Some(path) = cli_override {
        return path.clone();
    }
    if let Ok(path) = std::env::var("KAKOMON_QUESTIONS") {
        return PathBuf::from(path);
    }
    data_dir().join(DEFAULT_QUESTIONS_NAME)
}

fn get_log_path() -> PathBuf {
    if let Ok(path) = std::env::var("KAKOMON_DATA") {
        return PathBuf::from(path);
    }
    data_dir().join(DEFAULT_LOG_NAME)
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let questions_path = get_questions_path(cli.questions.as_ref());
    let (questions, rejected) = source::load_from_file(&questions_path)?;
    if rejected > 0 && !cli.json {
        eprintln!("Warning: skipped {} malformed question records", rejected);
    }

    let log = ProgressLog::open(Box::new(FileBackend::new(get_log_path())));

    match cli.command {
        Commands::List {
            search,
            category,
            sub,
            session,
            unanswered,
            incorrect,
            group,
        } => {
            let criteria = FilterCriteria {
                search_text: search.unwrap_or_default(),
                parent: category,
                sub,
                session,
                only_unanswered: unanswered,
                only_incorrect: incorrect,
                group_mode: group.into(),
            };
            let visible = filter::filter(&questions, &log, &criteria);

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&visible))?);
            } else if visible.is_empty() {
                println!("No questions match.");
            } else {
                let latest = log.latest_by_question();
                println!("{:<10} {:<7} {:<28} QUESTION", "ID", "LAST", "CATEGORY");
                println!("{}", "-".repeat(90));
                for q in &visible {
                    let last = match latest.get(q.id.as_str()) {
                        Some(e) if e.is_correct => "ok",
                        Some(_) => "wrong",
                        None => "-",
                    };
                    println!(
                        "{:<10} {:<7} {:<28} {}",
                        q.id,
                        last,
                        truncate(&q.category, 26),
                        truncate(&q.question_text, 40)
                    );
                }
            }
        }

        Commands::Show { id } => {
            let question = find_question(&questions, &id)?;

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "question": question,
                        "latest": log.latest_by_question().get(id.as_str()),
                    })))?
                );
            } else {
                println!("ID: {}", question.id);
                println!("Category: {}", question.category);
                println!("Source: {}", question.source);
                println!();
                println!("{}", question.question_text);
                println!();
                for (i, choice) in question.choices.iter().enumerate() {
                    println!("  [{}] {}", i, choice.text);
                }
                if let Some(latest) = log.latest_by_question().get(id.as_str()) {
                    println!();
                    println!(
                        "Last attempt: {} (selected {:?})",
                        if latest.is_correct { "correct" } else { "incorrect" },
                        latest.selected_indices
                    );
                }
            }
        }

        Commands::Answer { id, choices } => {
            let question = find_question(&questions, &id)?;
            let selected = parse_choices(&choices)?;
            if selected.is_empty() {
                return Err(Box::new(QuizError::EmptySelection));
            }

            let evaluation = evaluate(question, &selected);
            let entry = AttemptLogEntry::record(question, &evaluation);
            let mut log = log;
            let persist_error = log.append(entry).err();

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "is_correct": evaluation.is_correct,
                        "selected": evaluation.selected,
                        "correct": evaluation.correct,
                        "persisted": persist_error.is_none(),
                    })))?
                );
            } else {
                if evaluation.is_correct {
                    println!("Correct!");
                } else {
                    println!("Incorrect. Correct answer: {:?}", evaluation.correct);
                }
                println!();
                for (i, choice) in question.choices.iter().enumerate() {
                    let mark = if evaluation.correct.contains(&i) {
                        "*"
                    } else {
                        " "
                    };
                    println!("{} [{}] {}", mark, i, choice.text);
                    if !choice.overview.is_empty() {
                        println!("      {}", choice.overview);
                    }
                }
            }
            if let Some(e) = persist_error {
                eprintln!("Warning: attempt was not saved: {}", e);
            }
        }

        Commands::Stats { by_sub, by_name } => {
            let granularity = if by_sub {
                Granularity::ParentSub
            } else {
                Granularity::Parent
            };
            let sort = if by_name {
                BreakdownSort::NameAsc
            } else {
                BreakdownSort::RateDesc
            };
            let snapshot = dashboard::summarize(&questions, &log, granularity, sort);

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&snapshot))?);
            } else {
                println!("=== Progress Statistics ===");
                println!("Total questions: {}", snapshot.total_questions);
                println!(
                    "Answered: {} ({} unanswered)",
                    snapshot.answered_count,
                    snapshot.total_questions.saturating_sub(snapshot.answered_count)
                );
                match snapshot.latest_accuracy {
                    Some(rate) => println!("Latest accuracy: {:.0}%", rate * 100.0),
                    None => println!("Latest accuracy: -"),
                }
                match snapshot.all_attempts_accuracy {
                    Some(rate) => println!("All attempts accuracy: {:.0}%", rate * 100.0),
                    None => println!("All attempts accuracy: -"),
                }
                if !snapshot.per_category.is_empty() {
                    println!();
                    println!("{:<36} {:>8} {:>8} {:>6}", "CATEGORY", "ANSWERED", "CORRECT", "RATE");
                    println!("{}", "-".repeat(62));
                    for row in &snapshot.per_category {
                        println!(
                            "{:<36} {:>8} {:>8} {:>5.0}%",
                            truncate(&row.category, 34),
                            row.answered,
                            row.correct,
                            row.rate * 100.0
                        );
                    }
                }
            }
        }

        Commands::Categories => {
            let groups = taxonomy::group_by_parent_then_sub(&questions);
            if cli.json {
                let data: Vec<serde_json::Value> = groups
                    .iter()
                    .flat_map(|(parent, subs)| {
                        subs.iter().map(move |(sub, qs)| {
                            serde_json::json!({
                                "parent": parent,
                                "sub": sub,
                                "count": qs.len(),
                            })
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string(&JsonOutput::ok(data))?);
            } else if groups.is_empty() {
                println!("No questions loaded.");
            } else {
                for (parent, subs) in &groups {
                    let total: usize = subs.values().map(Vec::len).sum();
                    println!("{} ({})", parent, total);
                    for (sub, qs) in subs {
                        println!("  {} ({})", sub, qs.len());
                    }
                }
            }
        }

        Commands::Sessions => {
            let groups = taxonomy::group_by_session(&questions);
            if cli.json {
                let data: Vec<serde_json::Value> = groups
                    .iter()
                    .map(|(label, qs)| {
                        serde_json::json!({ "session": label, "count": qs.len() })
                    })
                    .collect();
                println!("{}", serde_json::to_string(&JsonOutput::ok(data))?);
            } else if groups.is_empty() {
                println!("No questions loaded.");
            } else {
                println!("{:<30} QUESTIONS", "SESSION");
                println!("{}", "-".repeat(45));
                for (label, qs) in &groups {
                    println!("{:<30} {}", label, qs.len());
                }
            }
        }

        Commands::Tui => {
            tui::run(questions, log)?;
        }
    }

    Ok(())
}

fn find_question<'a>(questions: &'a [Question], id: &str) -> Result<&'a Question, QuizError> {
    questions
        .iter()
        .find(|q| q.id == id)
        .ok_or_else(|| QuizError::NotFound { id: id.to_string() })
}

fn parse_choices(input: &str) -> Result<Vec<usize>, String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| format!("Invalid choice index '{}'. Use e.g. --choices 0,2", s))
        })
        .collect()
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    mod parse_choices_tests {
        use super::*;

        #[test]
        fn parses_comma_separated_indices() {
            assert_eq!(parse_choices("0,2").unwrap(), vec![0, 2]);
        }

        #[test]
        fn tolerates_spaces_and_trailing_comma() {
            assert_eq!(parse_choices(" 1 , 3 ,").unwrap(), vec![1, 3]);
        }

        #[test]
        fn rejects_non_numeric() {
            assert!(parse_choices("0,x").is_err());
        }

        #[test]
        fn empty_input_is_empty() {
            assert!(parse_choices("").unwrap().is_empty());
        }
    }

    mod truncate_tests {
        use super::*;

        #[test]
        fn truncate_short_string() {
            assert_eq!(truncate("hello", 10), "hello");
        }

        #[test]
        fn truncate_exact_length() {
            assert_eq!(truncate("hello", 5), "hello");
        }

        #[test]
        fn truncate_long_string() {
            assert_eq!(truncate("hello world", 8), "hello...");
        }

        #[test]
        fn truncate_multibyte_safe() {
            assert_eq!(truncate("テクノロジ系", 5), "テク...");
        }
    }

    mod cli_parsing_tests {
        use super::*;

        #[test]
        fn parse_list_command() {
            let cli = Cli::try_parse_from(["kakomon", "list"]).unwrap();
            assert!(!cli.json);
            match cli.command {
                Commands::List {
                    search,
                    unanswered,
                    incorrect,
                    group,
                    ..
                } => {
                    assert!(search.is_none());
                    assert!(!unanswered);
                    assert!(!incorrect);
                    assert!(group == GroupArg::ParentSub);
                }
                _ => panic!("Expected List command"),
            }
        }

        #[test]
        fn parse_list_with_filters() {
            let cli = Cli::try_parse_from([
                "kakomon",
                "list",
                "--search",
                "sql",
                "--category",
                "テクノロジ系",
                "--incorrect",
                "--group",
                "session",
            ])
            .unwrap();
            match cli.command {
                Commands::List {
                    search,
                    category,
                    incorrect,
                    group,
                    ..
                } => {
                    assert_eq!(search, Some("sql".to_string()));
                    assert_eq!(category, Some("テクノロジ系".to_string()));
                    assert!(incorrect);
                    assert!(group == GroupArg::Session);
                }
                _ => panic!("Expected List command"),
            }
        }

        #[test]
        fn parse_show_command() {
            let cli = Cli::try_parse_from(["kakomon", "show", "q42"]).unwrap();
            match cli.command {
                Commands::Show { id } => assert_eq!(id, "q42"),
                _ => panic!("Expected Show command"),
            }
        }

        #[test]
        fn parse_answer_command() {
            let cli =
                Cli::try_parse_from(["kakomon", "answer", "q1", "--choices", "0,2"]).unwrap();
            match cli.command {
                Commands::Answer { id, choices } => {
                    assert_eq!(id, "q1");
                    assert_eq!(choices, "0,2");
                }
                _ => panic!("Expected Answer command"),
            }
        }

        #[test]
        fn parse_answer_short_flag() {
            let cli = Cli::try_parse_from(["kakomon", "answer", "q1", "-c", "1"]).unwrap();
            match cli.command {
                Commands::Answer { choices, .. } => assert_eq!(choices, "1"),
                _ => panic!("Expected Answer command"),
            }
        }

        #[test]
        fn parse_stats_flags() {
            let cli = Cli::try_parse_from(["kakomon", "stats", "--by-sub", "--by-name"]).unwrap();
            match cli.command {
                Commands::Stats { by_sub, by_name } => {
                    assert!(by_sub);
                    assert!(by_name);
                }
                _ => panic!("Expected Stats command"),
            }
        }

        #[test]
        fn parse_json_flag_global() {
            let cli1 = Cli::try_parse_from(["kakomon", "--json", "stats"]).unwrap();
            assert!(cli1.json);

            let cli2 = Cli::try_parse_from(["kakomon", "stats", "--json"]).unwrap();
            assert!(cli2.json);
        }

        #[test]
        fn parse_questions_override() {
            let cli =
                Cli::try_parse_from(["kakomon", "--questions", "/tmp/bank.json", "list"]).unwrap();
            assert_eq!(cli.questions, Some(PathBuf::from("/tmp/bank.json")));
        }

        #[test]
        fn parse_invalid_command_fails() {
            assert!(Cli::try_parse_from(["kakomon", "invalid"]).is_err());
        }

        #[test]
        fn parse_missing_required_arg_fails() {
            assert!(Cli::try_parse_from(["kakomon", "show"]).is_err());
            assert!(Cli::try_parse_from(["kakomon", "answer", "q1"]).is_err());
        }
    }

    mod data_path_tests {
        use super::*;

        #[test]
        fn questions_path_prefers_cli_override() {
            let path = get_questions_path(Some(&PathBuf::from("/tmp/override.json")));
            assert_eq!(path, PathBuf::from("/tmp/override.json"));
        }

        #[test]
        fn default_paths_end_with_well_known_names() {
            std::env::remove_var("KAKOMON_QUESTIONS");
            std::env::remove_var("KAKOMON_DATA");
            assert!(get_questions_path(None)
                .to_str()
                .unwrap()
                .ends_with(DEFAULT_QUESTIONS_NAME));
            assert!(get_log_path().to_str().unwrap().ends_with(DEFAULT_LOG_NAME));
        }
    }
}
