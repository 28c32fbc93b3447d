use once_cell::sync::OnceCell;
use std::collections::HashMap;

static REGISTERS: OnceCell<HashMap<String, u8>> = OnceCell::new();

const ALIASES: &[(&str, u8)] = &[
    ("zero", 0),
    ("ra", 1),
    ("sp", 2),
    ("gp", 3),
    ("tp", 4),
    ("t0", 5),
    ("t1", 6),
    ("t2", 7),
    ("s0", 8),
    ("fp", 8),
    ("s1", 9),
    ("a0", 10),
    ("a1", 11),
    ("a2", 12),
    ("a3", 13),
    ("a4", 14),
    ("a5", 15),
    ("a6", 16),
    ("a7", 17),
    ("s2", 18),
    ("s3", 19),
    ("s4", 20),
    ("s5", 21),
    ("s6", 22),
    ("s7", 23),
    ("s8", 24),
    ("s9", 25),
    ("s10", 26),
    ("s11", 27),
    ("t3", 28),
    ("t4", 29),
    ("t5", 30),
    ("t6", 31),
];

fn file() -> &'static HashMap<String, u8> {
    REGISTERS.get_or_init(|| {
        let mut map = HashMap::new();
        for index in 0..32u8 {
            map.insert(format!("x{index}"), index);
        }
        for (alias, index) in ALIASES {
            map.insert((*alias).to_owned(), *index);
        }
        map
    })
}

/// Resolve a register name or ABI alias to its index.
pub fn register(name: &str) -> Option<u8> {
    file().get(name).copied()
}

/// The canonical spelling used when disassembling.
pub fn canonical(index: u8) -> String {
    format!("x{index}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_abi_names() {
        assert_eq!(register("x0"), Some(0));
        assert_eq!(register("zero"), Some(0));
        assert_eq!(register("sp"), Some(2));
        assert_eq!(register("a0"), Some(10));
        assert_eq!(register("fp"), register("s0"));
        assert_eq!(register("t6"), Some(31));
    }

    #[test]
    fn out_of_range_names() {
        assert_eq!(register("x32"), None);
        assert_eq!(register("x36"), None);
        assert_eq!(register("x46"), None);
        assert_eq!(register("q1"), None);
    }
}
