use arch::inst::Inst;
use arch::reg::Reg;
use minic::error::Error;
use minic::gen::asm::{Directive, Line};
use minic::gen::layout::StructLayouts;
use minic::{compile, parse, Asm};

fn asm(code: &str) -> Asm {
    match compile("test.c", code) {
        Ok(asm) => {
            println!("{asm}");
            asm
        }
        Err(Error::Diagnostics(diags)) => panic!("{diags:?}"),
        Err(err) => panic!("{err}"),
    }
}

fn position(asm: &Asm, cond: impl Fn(&Inst) -> bool) -> usize {
    asm.insts()
        .position(cond)
        .unwrap_or_else(|| panic!("instruction not found"))
}

/// `return 1 + (1 + (... + 1))` keeps one temporary per literal alive.
fn nested_sum(n: usize) -> String {
    let expr = (1..n).fold("1".to_string(), |acc, _| format!("1 + ({acc})"));
    format!("int main() {{ return {expr}; }}")
}

macro_rules! case {
    ($name:ident, $code:expr, $check:expr) => {
        #[test]
        fn $name() {
            let asm = asm($code);
            let check: fn(&Asm) = $check;
            check(&asm);
        }
    };
}

#[test]
fn test_packed_layout() {
    let (program, errors) = parse(
        "struct s { int x; char y; int z; };\nstruct t { char c; struct s inner; int arr[2]; };",
    );
    assert!(errors.is_empty());
    let layouts = StructLayouts::compute(&program.structs).unwrap();

    let s = layouts.get("s").unwrap();
    assert_eq!(s.fields["x"], 0);
    assert_eq!(s.fields["y"], 4);
    assert_eq!(s.fields["z"], 5);
    assert_eq!(s.size, 9);

    let t = layouts.get("t").unwrap();
    assert_eq!(t.fields["inner"], 1);
    assert_eq!(t.fields["arr"], 10);
    assert_eq!(t.size, 18);
}

#[test]
fn test_register_limit() {
    assert!(compile("test.c", &nested_sum(18)).is_ok());
    assert!(matches!(
        compile("test.c", &nested_sum(19)),
        Err(Error::OutOfRegisters(18))
    ));
}

#[test]
fn test_missing_main() {
    assert!(matches!(
        compile("test.c", "int f() { return 0; }"),
        Err(Error::MissingMain)
    ));
}

#[test]
fn test_stage_errors() {
    let Err(Error::Diagnostics(diags)) = compile("test.c", "int main() { return x; }") else {
        panic!("expected diagnostics");
    };
    assert!(matches!(diags[0].error, Error::UndeclaredVariable(_)));
}

case!(
    entry_sequence,
    "void main() { }",
    |asm| {
        let insts: Vec<&Inst> = asm.insts().collect();
        assert_eq!(*insts[0], Inst::Jal("main".to_string()));
        assert_eq!(*insts[1], Inst::J("__exit".to_string()));
        assert!(asm.0.contains(&Line::Label("main".to_string())));
        assert!(asm.0.contains(&Line::Label("__ret_main".to_string())));
        let exit = asm
            .0
            .iter()
            .position(|line| *line == Line::Label("__exit".to_string()))
            .unwrap();
        assert_eq!(asm.0[exit + 1], Line::Inst(Inst::Li(Reg::V0, 10)));
        assert_eq!(asm.0[exit + 2], Line::Inst(Inst::Syscall));
    }
);

case!(
    multiply_before_add,
    "int main() { return 1 + 2 * 3; }",
    |asm| {
        let mul = position(asm, |inst| matches!(inst, Inst::Mul(..)));
        let add = position(asm, |inst| matches!(inst, Inst::Add(..)));
        assert!(mul < add);
    }
);

case!(
    print_syscall,
    "void main() { print_i(42); }",
    |asm| {
        let li = position(asm, |inst| *inst == Inst::Li(Reg::V0, 1));
        let insts: Vec<&Inst> = asm.insts().collect();
        assert!(matches!(insts[li - 1], Inst::Move(Reg::A0, _)));
        assert_eq!(*insts[li + 1], Inst::Syscall);
    }
);

case!(
    string_literal_in_data,
    "void main() { print_s(\"hi\\n\"); print_s(\"yo\"); }",
    |asm| {
        let data = asm
            .0
            .iter()
            .position(|line| *line == Line::Label("__str_1".to_string()))
            .unwrap();
        assert_eq!(
            asm.0[data + 1],
            Line::Directive(Directive::Asciiz("yo".to_string()))
        );
        assert!(asm.insts().any(|inst| *inst == Inst::La(Reg::A0, "__str_0".to_string())));
        assert!(asm.to_string().contains(".asciiz \"hi\\n\""));
    }
);

case!(
    global_storage,
    "struct s { int x; char y; int z; };\nstruct s g;\nchar buf[3];\nvoid main() { }",
    |asm| {
        let text = asm.to_string();
        assert!(text.contains("g:\n    .space 9\n"));
        assert!(text.contains("buf:\n    .space 3\n"));
    }
);

case!(
    frame_setup,
    "int f(int a, char b) { int c; c = a; return c; }\nvoid main() { f(1, 'x'); }",
    |asm| {
        let text = asm.to_string();
        assert!(text.contains(
            "f:\n    addi $sp, $sp, -8\n    sw $ra, 4($sp)\n    sw $fp, 0($sp)\n    move $fp, $sp\n    addi $sp, $sp, -12\n    sw $a0, -4($fp)\n    sb $a1, -8($fp)\n"
        ));
        assert!(text.contains(
            "__ret_f:\n    move $sp, $fp\n    lw $fp, 0($sp)\n    lw $ra, 4($sp)\n    addi $sp, $sp, 8\n    jr $ra\n"
        ));
    }
);

case!(
    unique_labels,
    "void f(int a) { if (a) { } if (a) { } else { } }\nvoid main() { while (1 && 0) { } }",
    |asm| {
        for label in ["__else_0", "__endif_0", "__else_1", "__endif_1", "__while_2", "__endwhile_2", "__and_end_3"] {
            assert!(asm.0.contains(&Line::Label(label.to_string())), "{label}");
        }
    }
);

case!(
    char_access,
    "char c;\nvoid main() { c = 'a'; print_c(c); }",
    |asm| {
        assert!(asm.insts().any(|inst| matches!(inst, Inst::Sb(..))));
        assert!(asm.insts().any(|inst| matches!(inst, Inst::Lb(..))));
    }
);

case!(
    stack_arguments,
    "int f(int a, int b, int c, int d, int e) { return e; }\nvoid main() { f(1, 2, 3, 4, 5); }",
    |asm| {
        let insts: Vec<&Inst> = asm.insts().collect();
        let call = position(asm, |inst| *inst == Inst::Jal("f".to_string()));
        assert!(matches!(insts[call - 1], Inst::Sw(_, 0, Reg::Sp)));
        assert_eq!(*insts[call + 1], Inst::Addi(Reg::Sp, Reg::Sp, 4));
        assert!(asm.insts().any(|inst| matches!(inst, Inst::Lw(_, 8, Reg::Fp))));
    }
);
