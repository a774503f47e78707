use bus8::{
    config::{Config, Overflow},
    machine::{Machine, State},
    memory::ProgramMemory,
    register::RegisterName,
};

fn read_program() -> ProgramMemory {
    let source = include_str!("doubling.txt");

    ProgramMemory::parse(source)
        .expect("could not parse doubling.txt")
}

#[test]
fn test_doubling_emulate_program() {
    let mut m = Machine::new(read_program());

    // The trailing mvc never advances, so the program only stops at the cycle limit.
    assert_eq!(m.run_for(100).unwrap(), State::Running);
    assert_eq!(m.address(), Some("05"));
    assert_eq!(m.cycles(), 100);

    assert_eq!(m.register(RegisterName::C).value(), 0x80);
    assert_eq!(m.register(RegisterName::B).value(), 0x07);
    assert_eq!(m.register(RegisterName::A).value(), 0x80);
    assert_eq!(m.bus().read(), 0x07);
}

#[test]
fn test_doubling_loop_cycles() {
    let mut m = Machine::new(read_program());

    while m.address() != Some("done") {
        m.step().unwrap();
    }

    assert_eq!(m.cycles(), 21);
    assert_eq!(m.register(RegisterName::C).value(), 0x80);
}

#[test]
fn test_doubling_with_saturation() {
    let source = include_str!("doubling.txt").replace("jmg 0x40", "jme 0xFF");
    let memory = ProgramMemory::parse(&source).unwrap();

    let mut m = Machine::with_config(memory, Config { overflow: Overflow::Saturating });
    m.run_for(100).unwrap();

    assert_eq!(m.register(RegisterName::C).value(), 0xFF);
    assert_eq!(m.register(RegisterName::A).value(), 0xFF);
    assert_eq!(m.address(), Some("05"));
}
