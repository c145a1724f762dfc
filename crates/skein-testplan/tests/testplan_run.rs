//! Full-pipeline tests: program + string table + test plan.

use std::sync::Arc;

use skein_bytecode::{NodeBuilder, ProgramBuilder, Program};
use skein_markup::StringTable;
use skein_runtime::{MemoryVariableStorage, VariableStorage, VirtualMachine};
use skein_testplan::TestPlan;

fn example_program() -> Arc<Program> {
    Arc::new(
        ProgramBuilder::new("example")
            .node(
                NodeBuilder::new("Start")
                    .run_line("line:hi")
                    .add_option("line:left", "Left")
                    .add_option("line:right", "Right")
                    .show_options()
                    .run_node(),
            )
            .node(
                NodeBuilder::new("Left")
                    .run_line("line:left-taken")
                    .stop(),
            )
            .node(
                NodeBuilder::new("Right")
                    .run_command("wave")
                    .run_line("line:bye")
                    .stop(),
            )
            .build(),
    )
}

fn example_table() -> StringTable {
    let csv = "\
id,text,file,node,lineNumber
line:hi,Hi there!,ex.dlg,Start,1
line:left,Go left,ex.dlg,Start,2
line:right,Go right,ex.dlg,Start,3
line:left-taken,You went left.,ex.dlg,Left,5
line:bye,Bye!,ex.dlg,Right,7
";
    StringTable::read(csv.as_bytes(), "en").expect("table")
}

fn machine(program: Arc<Program>) -> VirtualMachine {
    let vars: Arc<dyn VariableStorage> = Arc::new(MemoryVariableStorage::new());
    VirtualMachine::new(program, vars)
}

#[test]
fn plan_matches_dialogue() {
    let plan_text = "\
# choose the second option
line: Hi there!
option: Go left
option: Go right
select: 2
command: wave
line: Bye!
stop
";
    let mut plan = TestPlan::read(plan_text, example_table()).expect("plan");
    machine(example_program())
        .run(&mut plan, "Start")
        .expect("run");
    plan.complete().expect("complete");
}

#[test]
fn plan_taking_the_other_branch() {
    let plan_text = "\
line: Hi there!
option: Go left
option: Go right
select: 1
line: You went left.
";
    let mut plan = TestPlan::read(plan_text, example_table()).expect("plan");
    machine(example_program())
        .run(&mut plan, "Start")
        .expect("run");
    plan.complete().expect("complete");
}

#[test]
fn mismatched_line_fails_the_run() {
    let plan_text = "line: Hello, wrong text!\n";
    let mut plan = TestPlan::read(plan_text, example_table()).expect("plan");
    let err = machine(example_program())
        .run(&mut plan, "Start")
        .expect_err("must fail");
    assert!(err.to_string().contains("test plan got line"), "got {err}");
}

#[test]
fn leftover_steps_are_incomplete() {
    let plan_text = "\
line: Hi there!
option: Go left
option: Go right
select: 1
line: You went left.
command: never happens
";
    let mut plan = TestPlan::read(plan_text, example_table()).expect("plan");
    machine(example_program())
        .run(&mut plan, "Start")
        .expect("run");
    assert!(plan.complete().is_err());
}

/// A program shaped like real compiler output: variables, comparisons
/// lowered to CALL_FUNC, conditional jumps over dead branches, option
/// conditions, and command interpolation.
fn shop_program() -> Arc<Program> {
    Arc::new(
        ProgramBuilder::new("shop")
            .initial_value("$gold", skein_bytecode::Operand::float(5.0))
            .node(
                NodeBuilder::new("Start")
                    // <<set $gold to $gold + 10>>
                    .push_variable("$gold")
                    .push_float(10.0)
                    .push_float(2.0)
                    .call_func("Number.Add")
                    .store_variable("$gold")
                    .pop()
                    // line with the new balance
                    .push_variable("$gold")
                    .run_line_with_substitutions("line:balance", 1)
                    // if $gold >= 10 ... show the buy option as available
                    .push_variable("$gold")
                    .push_float(10.0)
                    .push_float(2.0)
                    .call_func("Number.GreaterThanOrEqualTo")
                    .add_option_with("line:buy", "Buy", 0, true)
                    .add_option("line:leave", "Leave")
                    .show_options()
                    .run_node(),
            )
            .node(
                NodeBuilder::new("Buy")
                    .push_variable("$gold")
                    .run_command_with_substitutions("purchase sword {0}", 1)
                    .run_line("line:bought")
                    .stop(),
            )
            .node(NodeBuilder::new("Leave").run_line("line:later").stop())
            .build(),
    )
}

fn shop_table() -> StringTable {
    let csv = "\
id,text,file,node,lineNumber
line:balance,You have {0} gold.,shop.dlg,Start,2
line:buy,Buy the sword,shop.dlg,Start,4
line:leave,Leave the shop,shop.dlg,Start,5
line:bought,It is yours.,shop.dlg,Buy,9
line:later,Come back soon!,shop.dlg,Leave,12
";
    StringTable::read(csv.as_bytes(), "en").expect("table")
}

#[test]
fn shop_scenario_buying() {
    let plan_text = "\
line: You have 15 gold.
option: Buy the sword
option: Leave the shop
select: 1
command: purchase sword 15
line: It is yours.
";
    let mut plan = TestPlan::read(plan_text, shop_table()).expect("plan");
    machine(shop_program()).run(&mut plan, "Start").expect("run");
    plan.complete().expect("complete");
}

#[test]
fn shop_scenario_variables_persist() {
    let vars = Arc::new(MemoryVariableStorage::new());
    let storage: Arc<dyn VariableStorage> = Arc::clone(&vars) as Arc<dyn VariableStorage>;
    let mut vm = VirtualMachine::new(shop_program(), storage);

    let plan_text = "\
line: You have 15 gold.
option: Buy the sword
option: Leave the shop
select: 2
line: Come back soon!
";
    let mut plan = TestPlan::read(plan_text, shop_table()).expect("plan");
    vm.run(&mut plan, "Start").expect("run");
    plan.complete().expect("complete");

    // Storage now shadows the initial value, so a second run starts from
    // the stored balance.
    let plan_text = "\
line: You have 25 gold.
option: Buy the sword
option: Leave the shop
select: 2
line: Come back soon!
";
    let mut plan = TestPlan::read(plan_text, shop_table()).expect("plan");
    vm.run(&mut plan, "Start").expect("run");
    plan.complete().expect("complete");
}
