mod entity;
pub use entity::Entity;

mod expr;
pub use expr::{Condition, Connective, Expr, Filter, IntoExpr, Op};

mod from_value;
pub use from_value::FromValue;

mod join;
pub use join::{Join, JoinKind};

mod key;
pub use key::Key;

mod order;
pub use order::{Direction, OrderBy};

mod query;
pub use query::{Query, QueryKind, Selection, TableRef};

mod record;
pub use record::Record;

mod value;
pub use value::{Serializable, Value};
