//! A small driver that assembles a program by hand, runs it, and prints the
//! final machine state.

use ovm::{Machine, Object, Operation, Program, RegisterKind, StreamKind};

fn main() {
  #[cfg(feature = "trace_computation")]
  println!("Computation Tracing ENABLED");

  // main: g1 = 30 + 5, copy it to STATUS, print it.
  let program = Program::new(vec![
    Operation::def_label(Object::label(0)),
    Operation::move_value(Object::register(RegisterKind::General1), Object::from(30)),
    Operation::add(Object::register(RegisterKind::General1), Object::from(5)),
    Operation::move_value(Object::register(RegisterKind::Status), Object::register(RegisterKind::General1)),
    Operation::syscall_write(Object::from(StreamKind::StandardOut), Object::register(RegisterKind::General1)),
    Operation::syscall_write(Object::from(StreamKind::StandardOut), Object::from('\n')),
    Operation::ret(),
  ]);

  let mut machine = Machine::new(16, 16);
  machine.load(program);
  println!("# Loaded Program\n{}\n", machine.program().export());

  if let Err(error) = machine.collect_labels() {
    eprintln!("label collection failed: {}", error);
    std::process::exit(1);
  }

  match machine.run() {

    Ok(()) => {
      println!("# Final Machine State\n{}", machine);
    }

    Err(error) => {
      eprintln!("execution failed: {}", error);
      eprintln!("{}", machine);
      std::process::exit(1);
    }

  }
}
