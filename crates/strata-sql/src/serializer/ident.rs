use super::{Formatter, Params, ToSql};

/// Select-list entries starting with one of these are functions or keywords
/// and are emitted verbatim.
const VERBATIM_PREFIXES: &[&str] = &[
    "COUNT(",
    "MAX(",
    "MIN(",
    "SUM(",
    "AVG(",
    "DISTINCT ",
    "LOWER(",
    "UPPER(",
    "RANDOM(",
    "RAND(",
];

pub(super) struct Ident<S>(pub(super) S);

impl<S: AsRef<str>> ToSql for Ident<S> {
    fn to_sql<T: Params>(self, f: &mut Formatter<'_, T>) {
        let ident = self.0.as_ref();

        if is_verbatim(ident) {
            f.dst.push_str(ident);
            return;
        }

        let quote = f.serializer.flavor.quote_char();

        for (i, segment) in ident.split('.').enumerate() {
            if i > 0 {
                f.dst.push('.');
            }

            if segment == "*" {
                f.dst.push('*');
                continue;
            }

            f.dst.push(quote);
            for ch in segment.chars() {
                if ch == quote {
                    f.dst.push(quote);
                }
                f.dst.push(ch);
            }
            f.dst.push(quote);
        }
    }
}

fn is_verbatim(ident: &str) -> bool {
    ident == "*"
        || VERBATIM_PREFIXES.iter().any(|prefix| {
            ident
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
        })
}
