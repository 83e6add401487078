use std::{borrow::Borrow, collections::HashMap, hash::Hash};

pub type Result = std::result::Result<String, InterpError>;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum InterpError {
    #[error("Undefined variable '{0}' at {}", .1 + 1)]
    UndefinedVar(String, usize),

    #[error("Unclosed brace (found open brace at {})", .0 + 1)]
    UnclosedBrace(usize),
}

/// Substitutes `{name}` placeholders in `fmt` with the values in
/// `variables`. Literal braces are written `{{` and `}}`.
pub fn interp<K, V>(fmt: &str, variables: &HashMap<K, V>) -> Result
where
    K: Borrow<str> + Hash + Eq,
    V: AsRef<str>,
{
    let mut res = String::with_capacity(fmt.len() * 2);
    let mut chars = fmt.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    res.push('{');
                    continue;
                }
                let mut var_name = String::with_capacity(16);
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    var_name.push(c);
                }
                if !closed {
                    return Err(InterpError::UnclosedBrace(i));
                }
                let Some(value) = variables.get(var_name.as_str()) else {
                    return Err(InterpError::UndefinedVar(var_name, i))
                };
                res += value.as_ref();
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                }
                res.push('}');
            }
            _ => res.push(c),
        }
    }

    res.shrink_to_fit();
    Ok(res)
}

#[cfg(test)]
mod test {
    use super::*;

    fn vars() -> HashMap<&'static str, &'static str> {
        let mut m = HashMap::new();
        m.insert("hw", "2");
        m.insert("p", "3");
        m.insert("case", "7");
        m.insert("student", "20180001");
        m
    }

    #[test]
    fn interp_ok() {
        let vars = vars();

        assert_eq!(interp("hello", &vars).unwrap(), "hello");
        assert_eq!(interp("{hw}", &vars).unwrap(), "2");
        assert_eq!(
            interp("test_hw{hw}/p{p}/{case}.in", &vars).unwrap(),
            "test_hw2/p3/7.in"
        );
        assert_eq!(
            interp("gitlab/{student}/hw{hw}/hw{hw}_{p}", &vars).unwrap(),
            "gitlab/20180001/hw2/hw2_3"
        );
        assert_eq!(interp("{hw}{p}", &vars).unwrap(), "23");
        assert_eq!(interp("a {{literal}} b", &vars).unwrap(), "a {literal} b");
        assert_eq!(interp("{{{hw}}}", &vars).unwrap(), "{2}");
        assert_eq!(interp("}}", &vars).unwrap(), "}");
        assert_eq!(interp("", &vars).unwrap(), "");
    }

    #[test]
    fn interp_ng() {
        let vars = vars();

        assert_eq!(
            interp("hw{homework}", &vars).unwrap_err(),
            InterpError::UndefinedVar("homework".to_owned(), 2)
        );
        assert_eq!(
            interp("{hw}/p{p", &vars).unwrap_err(),
            InterpError::UnclosedBrace(6),
        );
    }
}
