use minic::grammer::lexer::Lexer;
use minic::grammer::token::{TokenKind, TokenKind::*};

fn assert(code: &str, expects: Vec<TokenKind>) {
    let tokens = Lexer::new(code).parse();

    println!(" {code}");
    for token in &tokens {
        print!("\r\x1b[{}C^", token.pos.col);
    }
    println!();
    for (idx, token) in tokens.iter().enumerate() {
        println!("{:>2}: {:?}", idx, token.kind);
    }

    assert_eq!(tokens.len(), expects.len() + 1);
    for (idx, expect) in expects.iter().enumerate() {
        assert_eq!(tokens[idx].kind, *expect);
    }
    assert_eq!(tokens.last().map(|t| &t.kind), Some(&Eof));
}

macro_rules! case {
    ($name:ident, $code:expr, $expects:expr) => {
        #[test]
        fn $name() {
            assert($code, $expects);
        }
    };
}

case!(
    test_main,
    "int main() { return 0; } // done",
    vec![
        KwInt,
        Ident(format!("main")),
        LParen,
        RParen,
        LCurly,
        KwReturn,
        Number(format!("0"), 0),
        Semicolon,
        RCurly,
        Comment(format!("done")),
    ]
);

case!(
    test_include,
    "#include \"minic-stdlib.h\"",
    vec![KwInclude, Text(format!("minic-stdlib.h"))]
);

case!(
    test_double_char,
    "a==b!=c<=d>=e&&f||g",
    vec![
        Ident(format!("a")),
        EqualEqual,
        Ident(format!("b")),
        ExclEqual,
        Ident(format!("c")),
        LAngleEqual,
        Ident(format!("d")),
        RAngleEqual,
        Ident(format!("e")),
        AmpAmp,
        Ident(format!("f")),
        PipePipe,
        Ident(format!("g")),
    ]
);

case!(
    test_struct_access,
    "struct node* n; n.next[2]",
    vec![
        KwStruct,
        Ident(format!("node")),
        Star,
        Ident(format!("n")),
        Semicolon,
        Ident(format!("n")),
        Period,
        Ident(format!("next")),
        LBracket,
        Number(format!("2"), 2),
        RBracket,
    ]
);

case!(
    test_literals,
    "'a' '\\n' \"x\\ty\" 0x1F sizeof",
    vec![
        Char('a'),
        Char('\n'),
        Text(format!("x\ty")),
        Number(format!("0x1F"), 31),
        KwSizeof,
    ]
);

case!(
    test_block_comment,
    "x /* multi\nline */ y",
    vec![
        Ident(format!("x")),
        Comment(format!("multi\nline")),
        Ident(format!("y")),
    ]
);

case!(
    test_errors,
    "@ /* open",
    vec![Error(format!("@")), Error(format!("/* open"))]
);

#[test]
fn test_positions() {
    let tokens = Lexer::new("int\n  x;").parse();
    assert_eq!((tokens[0].pos.row, tokens[0].pos.col), (1, 1));
    assert_eq!((tokens[1].pos.row, tokens[1].pos.col), (2, 3));
    assert_eq!((tokens[2].pos.row, tokens[2].pos.col), (2, 4));
}
