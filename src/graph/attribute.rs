#[derive(Clone, PartialEq, Debug)]
pub enum Attribute<Flow> {
    Number(Flow),
    Text(String),
    Flag(bool),
}

impl<Flow: Copy> Attribute<Flow> {
    /// Numeric value, or `None` for text and flags.
    pub fn as_number(&self) -> Option<Flow> {
        match self {
            Attribute::Number(value) => Some(*value),
            _ => None,
        }
    }
}

impl<Flow> From<&str> for Attribute<Flow> {
    fn from(value: &str) -> Self {
        Attribute::Text(value.to_string())
    }
}

impl<Flow> From<bool> for Attribute<Flow> {
    fn from(value: bool) -> Self {
        Attribute::Flag(value)
    }
}

macro_rules! impl_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Attribute<$t> {
                fn from(value: $t) -> Self {
                    Attribute::Number(value)
                }
            }
        )*
    };
}

impl_from_number!(i8, i16, i32, i64, i128, isize);
