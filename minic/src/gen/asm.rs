use arch::inst::Inst;
use color_print::cformat;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Data,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    // .align n (2^n bytes)
    Align(u32),
    // .space n
    Space(usize),
    // .asciiz "text"
    Asciiz(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Section(Section),
    Label(String),
    Directive(Directive),
    Inst(Inst),
}

impl From<Inst> for Line {
    fn from(inst: Inst) -> Self {
        Line::Inst(inst)
    }
}

/// One assembly file, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Asm(pub Vec<Line>);

impl Asm {
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.0.iter().map(|line| line.to_string())
    }

    pub fn insts(&self) -> impl Iterator<Item = &Inst> {
        self.0.iter().filter_map(|line| match line {
            Line::Inst(inst) => Some(inst),
            _ => None,
        })
    }

    /// Colored listing for the terminal
    pub fn cformat(&self) -> String {
        self.0
            .iter()
            .map(|line| match line {
                Line::Section(_) | Line::Directive(_) => cformat!("<m>{}</>", line),
                Line::Label(label) => cformat!("<g,bold>{}</>:", label),
                Line::Inst(inst) => format!("    {}", inst.cformat()),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Data => write!(f, ".data"),
            Section::Text => write!(f, ".text"),
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Align(n) => write!(f, ".align {n}"),
            Directive::Space(n) => write!(f, ".space {n}"),
            Directive::Asciiz(text) => write!(f, ".asciiz \"{}\"", escape(text)),
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Line::Section(section) => write!(f, "{section}"),
            Line::Label(label) => write!(f, "{label}:"),
            Line::Directive(directive) => write!(f, "    {directive}"),
            Line::Inst(inst) => write!(f, "    {inst}"),
        }
    }
}

impl fmt::Display for Asm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.0 {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

fn escape(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            '\n' => "\\n".to_string(),
            '\t' => "\\t".to_string(),
            '\r' => "\\r".to_string(),
            '\0' => "\\0".to_string(),
            '\\' => "\\\\".to_string(),
            '"' => "\\\"".to_string(),
            ch => ch.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arch::reg::Reg;

    #[test]
    fn test_display() {
        let asm = Asm(vec![
            Line::Section(Section::Data),
            Line::Label("__str_0".to_string()),
            Line::Directive(Directive::Asciiz("hi\n\"x\"".to_string())),
            Line::Section(Section::Text),
            Line::Label("main".to_string()),
            Inst::Lw(Reg::Ra, 4, Reg::Sp).into(),
        ]);
        assert_eq!(
            asm.to_string(),
            ".data\n__str_0:\n    .asciiz \"hi\\n\\\"x\\\"\"\n.text\nmain:\n    lw $ra, 4($sp)\n"
        );
    }
}
