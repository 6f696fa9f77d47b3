use crate::Value;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    #[default]
    None,
    SqlAlterTable,
    SqlCreateTable,
    SqlDeleteFrom,
    SqlDropTable,
    SqlGroupBy,
    SqlInsertInto,
    SqlJoin,
    SqlOrderBy,
    SqlSelect,
    SqlUpdate,
    SqlWhere,
}

/// State carried while a statement is being written.
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    /// Number of placeholders written so far.
    pub counter: u32,
    pub fragment: Fragment,
    pub qualify_columns: bool,
    /// Values bound to the placeholders, in placeholder order.
    pub binds: Vec<Value>,
}

impl Context {
    pub fn new(fragment: Fragment, qualify_columns: bool) -> Self {
        Self {
            counter: 0,
            fragment,
            qualify_columns,
            binds: Vec::new(),
        }
    }
    /// Enter `fragment`, returning the previous one.
    pub fn switch_fragment(&mut self, fragment: Fragment) -> Fragment {
        std::mem::replace(&mut self.fragment, fragment)
    }
    pub fn bind(&mut self, value: Value) {
        self.counter += 1;
        self.binds.push(value);
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new(Fragment::None, true)
    }
}
