use std::cell::RefCell;
use std::rc::Rc;

use bus8::{
    config::Config,
    event::Event,
    machine::{Machine, State},
    memory::ProgramMemory,
    register::RegisterName,
};

use slog::{Logger, Drain, o};
use slog_term::{TermDecorator, FullFormat};

fn logger() -> Logger {
    let decorator = TermDecorator::new().build();
    let drain = FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    Logger::root(drain, o!())
}

fn read_program() -> ProgramMemory {
    let source = include_str!("countdown.txt");

    ProgramMemory::parse_with_logger(source, logger())
        .expect("could not parse countdown.txt")
}

#[test]
fn test_countdown_read_program() {
    let p = read_program();

    let addresses: Vec<&str> = p.iter().map(|(address, _)| address).collect();
    assert_eq!(addresses, vec!["00", "01", "loop", "03", "04", "done"]);
    assert!(p.check().is_ok());
}

#[test]
fn test_countdown_load_from_file() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/countdown.txt");
    let p = ProgramMemory::load_from(path).expect("could not load countdown.txt");

    assert_eq!(p.len(), 6);
    assert!(ProgramMemory::load_from("does/not/exist.txt").is_err());
}

#[test]
fn test_countdown_emulate_program() {
    let mut m = Machine::with_logger(read_program(), Config::default(), logger());

    let values = Rc::new(RefCell::new(Vec::new()));
    let sink = values.clone();

    m.add_listener(move |event: &Event| {
        if let Event::RegisterChange { register: RegisterName::C, value } = event {
            sink.borrow_mut().push(*value);
        }
    });

    while !m.is_halted() {
        println!("{}", m);
        m.step().unwrap();
    }

    assert_eq!(m.state(), State::Halted);
    assert_eq!(m.cycles(), 17);
    assert_eq!(m.address(), Some("done"));
    assert_eq!(*values.borrow(), vec![5, 4, 3, 2, 1, 0]);
}
