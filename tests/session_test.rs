//! Integration tests for the interactive session driven by a scripted console.

use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use twentyq::cli::session::Session;
use twentyq::config::Settings;
use twentyq::infrastructure::di::ServiceContainer;
use twentyq::infrastructure::traits::{Console, RealFileSystem};
use twentyq::util::testing;

/// Console replaying canned input lines and recording everything printed.
#[derive(Default)]
struct ScriptedConsole {
    input: VecDeque<String>,
    prompts: Vec<String>,
    output: Vec<String>,
}

impl ScriptedConsole {
    fn new(lines: &[&str]) -> Self {
        Self {
            input: lines.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn printed(&self, needle: &str) -> bool {
        self.output.iter().any(|line| line.contains(needle))
    }
}

impl Console for ScriptedConsole {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        Ok(self.input.pop_front())
    }

    fn print(&mut self, line: &str) {
        self.output.push(line.to_string());
    }
}

fn container(data_file: PathBuf, autoload: bool, autosave: bool) -> ServiceContainer {
    testing::init_test_setup();
    let settings = Settings {
        data_file,
        index_buckets: 16,
        autoload,
        autosave,
    };
    ServiceContainer::with_deps(settings, Arc::new(RealFileSystem))
}

#[test]
fn given_wrong_guess_when_teaching_then_tree_learns_and_undo_redo_work() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("kb.atl");
    let container = container(file.clone(), false, false);
    let mut console = ScriptedConsole::new(&[
        "play",
        "n",
        "maybe",
        "n",
        "wolf",
        "Does it howl?",
        "y",
        "stats",
        "undo",
        "undo",
        "redo",
        "index does it howl",
        "quit",
    ]);

    let mut session = Session::start(&container, file.clone(), &mut console).unwrap();
    session.run().unwrap();
    assert_eq!(session.knowledge_base().tree().len(), 5);
    drop(session);

    assert!(console.printed("please answer y or n"));
    assert!(console.printed("Thanks, I learned about the wolf."));
    assert!(console.printed("nodes: 5, questions: 2, leaves: 3, depth: 3"));
    assert!(console.printed("undone"));
    assert!(console.printed("nothing to undo"));
    assert!(console.printed("redone"));
    assert!(console.printed("ids: 5"));
    assert!(console.prompts.iter().any(|p| p == "Is it a dog? [y/n]"));
    // autosave off
    assert!(!file.exists());
}

#[test]
fn given_autosave_when_input_ends_then_file_written_and_reloaded() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("kb.atl");

    let first = container(file.clone(), true, true);
    let mut console = ScriptedConsole::new(&["play", "y", "n", "lion", "Is it wild?", "y"]);
    Session::start(&first, file.clone(), &mut console)
        .unwrap()
        .run()
        .unwrap();
    assert!(file.exists());
    assert!(console.printed("bye"));

    let second = container(file.clone(), true, false);
    let mut console = ScriptedConsole::new(&["play", "y", "y", "y", "quit"]);
    let mut session = Session::start(&second, file.clone(), &mut console).unwrap();
    session.run().unwrap();
    drop(session);

    assert!(console.printed("loaded 5 nodes"));
    assert!(console.printed("I guessed it!"));
    assert!(console
        .prompts
        .iter()
        .any(|p| p == "Is it a lion? [y/n]"));
}

#[test]
fn given_corrupt_file_when_autoloading_then_seed_tree_used() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("kb.atl");
    std::fs::write(&file, b"not a knowledge file").unwrap();

    let container = container(file.clone(), true, false);
    let mut console = ScriptedConsole::new(&["check", "tree", "quit"]);
    let mut session = Session::start(&container, file, &mut console).unwrap();
    session.run().unwrap();
    assert_eq!(session.knowledge_base().tree().len(), 3);
    drop(session);

    assert!(console.printed("starting from the seed tree"));
    assert!(console.printed("tree is consistent"));
    assert!(console.printed("yes: [cat]"));
}

#[test]
fn given_compare_command_when_animals_known_then_paths_printed() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("kb.atl");
    let container = container(file.clone(), false, false);
    let mut console = ScriptedConsole::new(&["compare cat dog", "compare cat unicorn", "fly", "q"]);

    Session::start(&container, file, &mut console)
        .unwrap()
        .run()
        .unwrap();

    assert!(console.printed("no questions in common"));
    assert!(console.printed("  Does it meow? -> yes"));
    assert!(console.printed("  Does it meow? -> no"));
    assert!(console.printed("cannot find both cat and unicorn"));
    assert!(console.printed("unknown command: fly"));
}

#[test]
fn given_missing_file_when_loading_from_menu_then_error_reported() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("absent.atl");
    let container = container(file.clone(), true, false);
    let mut console = ScriptedConsole::new(&["load", "quit"]);

    Session::start(&container, file, &mut console)
        .unwrap()
        .run()
        .unwrap();

    assert!(console.printed("error: operation failed: open knowledge file"));
}
