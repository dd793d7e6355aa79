use emu::console::BufferConsole;
use minic::compile;

const TMAX: Option<u64> = Some(1_000_000);

fn run(code: &str, input: &str) -> Result<String, emu::Error> {
    let asm = match compile("test.c", code) {
        Ok(asm) => asm,
        Err(minic::Error::Diagnostics(diags)) => panic!("{diags:?}"),
        Err(err) => panic!("{err}"),
    };
    let mut console = BufferConsole::new(input);
    emu::run_source(&asm.to_string(), &mut console, TMAX)?;
    Ok(console.output)
}

fn assert(code: &str, input: &str, expect: &str) {
    let output = run(code, input).unwrap();
    println!("{output}");
    assert_eq!(output, expect);
}

macro_rules! case {
    ($name:ident, $code:expr, $expect:expr) => {
        #[test]
        fn $name() {
            assert($code, "", $expect);
        }
    };
    ($name:ident, $code:expr, $input:expr, $expect:expr) => {
        #[test]
        fn $name() {
            assert($code, $input, $expect);
        }
    };
}

case!(arith, "void main() { print_i(1 + 2 * 3); }", "7");

case!(
    signed_division,
    "void main() { print_i(-7 / 2); print_c(' '); print_i(-7 % 3); print_c(' '); print_i(-5); }",
    "-3 -1 -5"
);

case!(
    relational,
    "void main() { print_i(3 < 4 == 1); print_i(2 >= 3); print_i(4 <= 4); print_i(5 != 5); }",
    "1010"
);

case!(
    factorial,
    "int fact(int n) { if (n < 2) return 1; return n * fact(n - 1); }\n\
     void main() { print_i(fact(5)); print_c(' '); print_i(10 + fact(3)); }",
    "120 16"
);

case!(
    fibonacci,
    "int fib(int n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }\n\
     void main() { print_i(fib(15)); }",
    "610"
);

case!(
    while_loop,
    "void main() { int i; int sum; i = 1; sum = 0; while (i <= 10) { sum = sum + i; i = i + 1; } print_i(sum); }",
    "55"
);

case!(
    if_else,
    "void sign(int x) { if (x < 0) print_c('-'); else if (x == 0) print_c('0'); else print_c('+'); }\n\
     void main() { sign(-3); sign(0); sign(8); }",
    "-0+"
);

case!(
    strings,
    "int len(char* s) { int i; i = 0; while ((int) s[i] != 0) i = i + 1; return i; }\n\
     void main() { print_s((char*) \"hello\\n\"); print_i(len((char*) \"hello\")); }",
    "hello\n5"
);

case!(
    arrays,
    "void main() {\n\
       int a[5]; int i; int sum;\n\
       i = 0; while (i < 5) { a[i] = i * i; i = i + 1; }\n\
       sum = 0; i = 0; while (i < 5) { sum = sum + a[i]; i = i + 1; }\n\
       print_i(sum);\n\
     }",
    "30"
);

case!(
    matrix,
    "int m[2][3];\n\
     void main() { m[1][2] = 7; m[0][1] = 2; print_i(m[1][2] * m[0][1]); print_i(sizeof(int) * 6); }",
    "1424"
);

case!(
    char_buffer,
    "void main() { char buf[3]; buf[0] = 'o'; buf[1] = 'k'; buf[2] = '\\0'; print_s((char*) buf); }",
    "ok"
);

case!(
    structs,
    "struct pt { int x; char tag; int y; };\n\
     struct pt g;\n\
     struct pt make(int x, int y) { struct pt p; p.x = x; p.y = y; p.tag = 'k'; return p; }\n\
     int dot(struct pt a, struct pt b) { return a.x * b.x + a.y * b.y; }\n\
     void main() {\n\
       struct pt q;\n\
       g = make(2, 3);\n\
       q = make(4, 5);\n\
       print_i(dot(g, q));\n\
       print_c(g.tag);\n\
       print_i(sizeof(struct pt));\n\
       print_i(g == q);\n\
       q = g;\n\
       print_i(g == q);\n\
       print_i(make(6, 1).x);\n\
     }",
    "23k9016"
);

case!(
    linked_list,
    "struct node { int v; struct node* next; };\n\
     struct node* push(struct node* tail, int v) {\n\
       struct node* n;\n\
       n = (struct node*) mcmalloc(sizeof(struct node));\n\
       (*n).v = v;\n\
       (*n).next = tail;\n\
       return n;\n\
     }\n\
     void main() {\n\
       struct node* list; int i;\n\
       list = push(push(push(list, 1), 2), 3);\n\
       i = 0;\n\
       while (i < 3) { print_i((*list).v); list = (*list).next; i = i + 1; }\n\
     }",
    "321"
);

case!(
    many_arguments,
    "int f(int a, int b, int c, int d, int e, char g) { return a + b + c + d + e * (int) g; }\n\
     void main() { print_i(f(1, 2, 3, 4, 5, 'A')); }",
    "335"
);

case!(
    short_circuit,
    "int touched;\n\
     int touch() { touched = touched + 1; return 1; }\n\
     void main() {\n\
       if (0 && touch()) print_i(9);\n\
       if (1 || touch()) print_i(touched);\n\
       if (1 && touch()) print_i(touched);\n\
       print_i(0 || 5);\n\
     }",
    "011"
);

case!(
    void_compare,
    "void g() { }\nvoid main() { g() == g(); g() != g(); print_i(1); }",
    "1"
);

case!(
    read_int_then_char,
    "void main() { print_i(read_i() * 2); print_c(read_c()); }",
    "21\nx",
    "42x"
);

case!(
    scopes,
    "int x;\n\
     void main() { int y; x = 1; y = 2; { int x; x = 10; print_i(x + y); } print_i(x); }",
    "121"
);

case!(
    read_input,
    "void main() { int a; a = read_i(); print_i(a * read_i()); print_c(read_c()); }",
    "6\n7 ignored\nx",
    "42x"
);

case!(
    echo_chars,
    "void main() { char c; c = read_c(); while ((int) c != '.') { print_c(c); c = read_c(); } }",
    "abc.def",
    "abc"
);

#[test]
fn test_division_by_zero() {
    let result = run("void main() { int z; z = 0; print_i(1 / z); }", "");
    assert!(matches!(result, Err(emu::Error::DivisionByZero(_))));
}

#[test]
fn test_infinite_loop() {
    let result = run("void main() { while (1) { } }", "");
    assert!(matches!(result, Err(emu::Error::StepLimit(_))));
}
