use weir::{
    DatabaseQuery, Driver, Executor, QueryResult, Result, SchemaQuery, SqlWriter, Statement,
    stream::Stream,
};

/// Executor wrapper keeping every query it forwards, with the statement the
/// driver writer produces for it.
pub struct Recorder<E: Executor> {
    pub inner: E,
    pub queries: Vec<(DatabaseQuery, Option<Statement>)>,
}

impl<E: Executor> Recorder<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            queries: Vec::new(),
        }
    }

    /// Recorded queries since the previous call.
    pub fn take(&mut self) -> Vec<(DatabaseQuery, Option<Statement>)> {
        std::mem::take(&mut self.queries)
    }

    pub fn last(&self) -> Option<&(DatabaseQuery, Option<Statement>)> {
        self.queries.last()
    }

    pub fn into_inner(self) -> E {
        self.inner
    }
}

impl<E: Executor> Executor for Recorder<E> {
    type Driver = E::Driver;

    fn driver(&self) -> &E::Driver {
        self.inner.driver()
    }

    fn run(&mut self, query: DatabaseQuery) -> impl Stream<Item = Result<QueryResult>> + Send {
        let statement = self.inner.driver().sql_writer().write_query(&query).ok();
        self.queries.push((query.clone(), statement));
        self.inner.run(query)
    }

    fn schema(&mut self, query: SchemaQuery) -> impl Future<Output = Result<()>> + Send {
        self.inner.schema(query)
    }
}
