use crate::error::Error;
use crate::memory::Memory;
use arch::inst::{is_label, parse_imm, Inst, Operand};
use bimap::BiMap;
use indexmap::IndexMap;

/// Address of the first instruction.
pub const TEXT_BASE: u32 = 0x0040_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Data,
    Text,
}

/// An assembled program: instructions, initial data image and label addresses.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub insts: Vec<Inst>,
    pub data: Vec<u8>,
    pub labels: IndexMap<String, u32>,
    /// First label placed at each address
    pub symbols: BiMap<String, u32>,
}

impl Program {
    pub fn address(&self, label: &str) -> Result<u32, Error> {
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| Error::UnknownLabel(label.to_string()))
    }

    pub fn label_at(&self, addr: u32) -> Option<&str> {
        self.symbols.get_by_right(&addr).map(String::as_str)
    }

    pub fn inst_at(&self, pc: u32) -> Option<&Inst> {
        let offset = pc.checked_sub(TEXT_BASE)?;
        if offset % 4 != 0 {
            return None;
        }
        self.insts.get((offset / 4) as usize)
    }

    pub fn text_end(&self) -> u32 {
        TEXT_BASE + 4 * self.insts.len() as u32
    }
}

/// Parse MARS-style assembly text.
pub fn load(source: &str) -> Result<Program, Error> {
    let mut program = Program::default();
    let mut section = Section::Text;

    for (idx, raw) in source.lines().enumerate() {
        let line_no = idx + 1;
        let mut line = strip_comment(raw).trim();

        // Any number of `label:` prefixes
        while let Some((head, rest)) = line.split_once(':') {
            let head = head.trim();
            if !is_label(head) {
                break;
            }
            let addr = match section {
                Section::Data => Memory::DATA_BASE + program.data.len() as u32,
                Section::Text => program.text_end(),
            };
            if program.labels.insert(head.to_string(), addr).is_some() {
                return Err(Error::DuplicateLabel(line_no, head.to_string()));
            }
            // An address keeps its first name
            let _ = program.symbols.insert_no_overwrite(head.to_string(), addr);
            line = rest.trim();
        }
        if line.is_empty() {
            continue;
        }

        if line.starts_with('.') {
            let (name, arg) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            let arg = arg.trim();
            match (name, section) {
                (".data", _) => section = Section::Data,
                (".text", _) => section = Section::Text,
                (".globl" | ".global", _) => {}
                (".align", Section::Data) => {
                    let power = parse_imm(arg)
                        .filter(|p| (0..=12).contains(p))
                        .ok_or_else(|| Error::Directive(line_no, line.to_string()))?;
                    let align = 1usize << power;
                    let padded = program.data.len().div_ceil(align) * align;
                    program.data.resize(padded, 0);
                }
                (".space", Section::Data) => {
                    let size = parse_imm(arg)
                        .and_then(|n| usize::try_from(n).ok())
                        .ok_or_else(|| Error::Directive(line_no, line.to_string()))?;
                    program.data.resize(program.data.len() + size, 0);
                }
                (".word", Section::Data) => {
                    for word in arg.split(',') {
                        let value = parse_imm(word.trim())
                            .ok_or_else(|| Error::Directive(line_no, line.to_string()))?;
                        program.data.extend(value.to_le_bytes());
                    }
                }
                (".asciiz", Section::Data) => {
                    let text = unescape(arg)
                        .ok_or_else(|| Error::Directive(line_no, line.to_string()))?;
                    program.data.extend(text.bytes());
                    program.data.push(0);
                }
                (".align" | ".space" | ".word" | ".asciiz", Section::Text) => {
                    return Err(Error::Misplaced(line_no, name.to_string()));
                }
                _ => return Err(Error::Directive(line_no, line.to_string())),
            }
            continue;
        }

        if section != Section::Text {
            return Err(Error::Misplaced(line_no, line.to_string()));
        }
        let inst = line.parse::<Inst>().map_err(|e| Error::Inst(line_no, e))?;
        program.insts.push(inst);
    }

    // Every referenced label must exist before anything runs
    for inst in &program.insts {
        for operand in inst.operands() {
            if let Operand::Label(label) = operand {
                program.address(&label)?;
            }
        }
    }
    log::debug!(
        "loaded {} instructions, {} data bytes, {} labels",
        program.insts.len(),
        program.data.len(),
        program.labels.len()
    );
    Ok(program)
}

/// Drop a `#` comment that is not inside a string literal.
fn strip_comment(line: &str) -> &str {
    let mut quoted = false;
    let mut escaped = false;
    for (idx, ch) in line.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            '#' if !quoted => return &line[..idx],
            _ => {}
        }
    }
    line
}

/// `"a\n"` to its contents.
fn unescape(arg: &str) -> Option<String> {
    let inner = arg.strip_prefix('"')?.strip_suffix('"')?;
    let mut text = String::new();
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            text.push(ch);
            continue;
        }
        text.push(match chars.next()? {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            _ => return None,
        });
    }
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arch::reg::Reg;

    #[test]
    fn test_sections_and_labels() {
        let program = load(
            ".data\n\
             .align 2\n\
             g: .space 5\n\
             __str_0:\n\
                 .asciiz \"a#b\\n\"\n\
             .text\n\
             main: li $t0, 1 # one\n\
                 j main\n",
        )
        .unwrap();
        assert_eq!(program.address("g").unwrap(), Memory::DATA_BASE);
        assert_eq!(program.address("__str_0").unwrap(), Memory::DATA_BASE + 5);
        assert_eq!(program.address("main").unwrap(), TEXT_BASE);
        assert_eq!(&program.data[5..], b"a#b\n\0");
        assert_eq!(program.insts[0], Inst::Li(Reg::T0, 1));
        assert_eq!(program.label_at(TEXT_BASE), Some("main"));
    }

    #[test]
    fn test_align_pads() {
        let program = load(".data\na: .space 1\n.align 2\nb: .space 4\n").unwrap();
        assert_eq!(program.address("b").unwrap(), Memory::DATA_BASE + 4);
    }

    #[test]
    fn test_unknown_label() {
        assert!(matches!(
            load(".text\nj nowhere\n"),
            Err(Error::UnknownLabel(label)) if label == "nowhere"
        ));
    }

    #[test]
    fn test_shared_address() {
        let program = load("__else_0:\n__endif_0:\nli $v0, 10\n").unwrap();
        assert_eq!(program.address("__endif_0").unwrap(), TEXT_BASE);
        assert_eq!(program.label_at(TEXT_BASE), Some("__else_0"));
    }

    #[test]
    fn test_duplicate_label() {
        assert!(matches!(
            load("a:\na:\n"),
            Err(Error::DuplicateLabel(2, _))
        ));
    }

    #[test]
    fn test_bad_instruction() {
        assert!(matches!(load("add $t0, $t1\n"), Err(Error::Inst(1, _))));
        assert!(matches!(load(".data\nli $t0, 1\n"), Err(Error::Misplaced(2, _))));
    }
}
