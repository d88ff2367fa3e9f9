use hack_vm::{translate_command, CodeWriter, Parser};

fn translate(unit: &str, program: &str) -> String {
    let mut buf = Vec::new();
    {
        let mut cw = CodeWriter::new(&mut buf).unwrap();
        cw.set_unit(unit);
        for result in Parser::new(unit, program) {
            let (_, command) = result.unwrap();
            translate_command(&mut cw, &command).unwrap();
        }
        cw.finish().unwrap();
    }
    String::from_utf8(buf).unwrap()
}

#[test]
fn output_begins_with_the_bootstrap() {
    let asm = translate("Main", "function Main.main 0\nreturn\n");
    assert!(asm.starts_with("@256\nD=A\n@SP\nM=D"));
    assert!(asm.contains("@Sys.init\n0;JMP"));
}

#[test]
fn static_symbols_are_namespaced_per_source_unit() {
    let asm_a = translate("FileA", "push constant 1\npop static 0\n");
    let asm_b = translate("FileB", "push constant 1\npop static 0\n");
    assert!(asm_a.contains("@FileA.0"));
    assert!(asm_b.contains("@FileB.0"));
    assert!(!asm_a.contains("FileB.0"));
}

#[test]
fn label_counter_resets_across_functions_but_not_within_one() {
    let asm = translate(
        "Foo",
        "function Foo.bar 0\neq\neq\nreturn\nfunction Foo.baz 0\neq\nreturn\n",
    );
    assert_eq!(asm.matches("(Foo.bar.0$IF_TRUE)").count(), 1);
    assert_eq!(asm.matches("(Foo.bar.1$IF_TRUE)").count(), 1);
    assert_eq!(asm.matches("(Foo.baz.0$IF_TRUE)").count(), 1);
}

#[test]
fn repeated_calls_get_distinct_return_address_labels() {
    let asm = translate(
        "Main",
        "function Main.main 0\ncall Foo.bar 0\ncall Foo.bar 0\nreturn\n",
    );
    assert!(asm.contains("(RET_ADDR$Main.main.0)"));
    assert!(asm.contains("(RET_ADDR$Main.main.1)"));
}

#[test]
fn user_labels_and_jumps_are_scoped_to_their_function() {
    let asm = translate(
        "Main",
        "function Main.loop 0\nlabel LOOP\ngoto LOOP\nreturn\n",
    );
    assert_eq!(asm.matches("(Main.loop$LOOP)").count(), 1);
    assert!(asm.contains("@Main.loop$LOOP"));
}

#[test]
fn every_declared_label_is_unique() {
    let asm = translate(
        "Main",
        "\
function Main.main 3
push constant 1
push constant 2
gt
push constant 1
push constant 2
lt
call Main.helper 0
call Main.helper 0
return
function Main.helper 0
push constant 0
return
",
    );

    let mut declared = Vec::new();
    for line in asm.lines() {
        if let Some(label) = line.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
            declared.push(label.to_string());
        }
    }

    let mut unique = declared.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(declared.len(), unique.len(), "duplicate label in {declared:?}");
}

#[test]
fn whitespace_and_comment_variations_produce_identical_output() {
    let plain = "push constant 7\npush constant 8\nadd\n";
    let noisy = "\n// header\npush constant 7   // first\n\npush constant 8 // second\nadd  // sum\n";
    assert_eq!(translate("F", plain), translate("F", noisy));
}
