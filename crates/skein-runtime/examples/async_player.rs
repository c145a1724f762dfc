//! Drives a dialogue from outside the machine thread.
//!
//! The machine runs on a worker thread with an [`AsyncAdapter`] as its
//! handler. The handler forwards each event into a channel; the main
//! thread prints events as they arrive and continues the machine when it
//! is ready. This is the shape a game loop takes: events arrive whenever
//! the machine produces them, and the loop answers on its own schedule.
//!
//! Run with `cargo run --example async_player`.

use std::sync::{mpsc, Arc};
use std::thread;

use skein_bytecode::{NodeBuilder, ProgramBuilder};
use skein_runtime::{
    AsyncAdapter, AsyncDialogueHandler, DialogueOption, Line, MemoryVariableStorage,
    VariableStorage, VirtualMachine,
};

enum Event {
    Line(Line),
    Options(Vec<DialogueOption>),
    Command(String),
    Done,
}

/// Forwards events to the main thread instead of handling them in place.
struct Forwarder {
    events: mpsc::Sender<Event>,
}

impl AsyncDialogueHandler for Forwarder {
    fn node_start(&mut self, adapter: &AsyncAdapter, _node_name: &str) {
        let _ = adapter.go();
    }

    fn prepare_for_lines(&mut self, adapter: &AsyncAdapter, _line_ids: &[String]) {
        let _ = adapter.go();
    }

    fn line(&mut self, _adapter: &AsyncAdapter, line: &Line) {
        let _ = self.events.send(Event::Line(line.clone()));
    }

    fn options(&mut self, _adapter: &AsyncAdapter, options: &[DialogueOption]) {
        let _ = self.events.send(Event::Options(options.to_vec()));
    }

    fn command(&mut self, _adapter: &AsyncAdapter, command: &str) {
        let _ = self.events.send(Event::Command(command.to_string()));
    }

    fn node_complete(&mut self, adapter: &AsyncAdapter, _node_name: &str) {
        let _ = adapter.go();
    }

    fn dialogue_complete(&mut self, adapter: &AsyncAdapter) {
        let _ = self.events.send(Event::Done);
        let _ = adapter.go();
    }
}

fn main() {
    let program = Arc::new(
        ProgramBuilder::new("tour")
            .node(
                NodeBuilder::new("Start")
                    .run_line("line:hello")
                    .add_option("line:again", "Start")
                    .add_option("line:enough", "End")
                    .show_options()
                    .run_node(),
            )
            .node(
                NodeBuilder::new("End")
                    .run_command("fade_out")
                    .run_line("line:bye")
                    .stop(),
            )
            .build(),
    );

    let (events_tx, events_rx) = mpsc::channel();
    let adapter = AsyncAdapter::new(Forwarder { events: events_tx });

    let mut machine_handler = adapter.clone();
    let worker = thread::spawn(move || {
        let vars: Arc<dyn VariableStorage> = Arc::new(MemoryVariableStorage::new());
        let mut vm = VirtualMachine::new(program, vars);
        vm.run(&mut machine_handler, "Start")
    });

    let mut rounds = 0;
    for event in events_rx {
        match event {
            Event::Line(line) => {
                println!("line: {}", line.id);
                adapter.go().expect("continue after line");
            }
            Event::Options(options) => {
                for option in &options {
                    println!("  option {}: {}", option.id, option.line.id);
                }
                // Loop once, then take the exit.
                rounds += 1;
                let choice = if rounds < 2 { 0 } else { 1 };
                println!("  choosing {choice}");
                adapter
                    .go_with_choice(choice)
                    .expect("continue after options");
            }
            Event::Command(command) => {
                println!("command: {command}");
                adapter.go().expect("continue after command");
            }
            Event::Done => {
                println!("dialogue complete");
                break;
            }
        }
    }

    worker.join().expect("join").expect("run");
}
