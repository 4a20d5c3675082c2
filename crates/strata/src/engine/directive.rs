use strata_core::stmt::{Direction, Op, Value};

/// Sort, filter and limit directives registered for one read call.
///
/// Each directive targets either a model's own query (`relation == None`)
/// or the member query of one of its relations.
#[derive(Debug, Default, Clone)]
pub(crate) struct Directives {
    entries: Vec<(String, Option<String>, Scoped)>,
}

/// The directives that apply to one query.
#[derive(Debug, Default, Clone)]
pub(crate) struct Scoped {
    pub(crate) sort: Vec<(String, Direction)>,
    pub(crate) filter: Vec<(String, Op, Value)>,
    pub(crate) limit: Option<u64>,
}

impl Directives {
    pub(crate) fn sort(
        &mut self,
        model: &str,
        relation: Option<&str>,
        column: &str,
        direction: Direction,
    ) {
        self.entry(model, relation)
            .sort
            .push((column.to_string(), direction));
    }

    pub(crate) fn filter(
        &mut self,
        model: &str,
        relation: Option<&str>,
        column: &str,
        op: Op,
        value: Value,
    ) {
        self.entry(model, relation)
            .filter
            .push((column.to_string(), op, value));
    }

    pub(crate) fn limit(&mut self, model: &str, relation: Option<&str>, limit: u64) {
        self.entry(model, relation).limit = Some(limit);
    }

    pub(crate) fn get(&self, model: &str, relation: Option<&str>) -> Option<&Scoped> {
        self.entries
            .iter()
            .find(|(m, r, _)| m == model && r.as_deref() == relation)
            .map(|(_, _, scoped)| scoped)
    }

    /// `true` if a filter targets the relation. Conditional relations are
    /// only traversed when one does.
    pub(crate) fn has_filter(&self, model: &str, relation: &str) -> bool {
        self.get(model, Some(relation))
            .is_some_and(|scoped| !scoped.filter.is_empty())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&mut self, model: &str, relation: Option<&str>) -> &mut Scoped {
        let index = match self
            .entries
            .iter()
            .position(|(m, r, _)| m == model && r.as_deref() == relation)
        {
            Some(index) => index,
            None => {
                self.entries.push((
                    model.to_string(),
                    relation.map(str::to_string),
                    Scoped::default(),
                ));
                self.entries.len() - 1
            }
        };

        &mut self.entries[index].2
    }
}

impl Scoped {
    pub(crate) fn is_empty(&self) -> bool {
        self.sort.is_empty() && self.filter.is_empty() && self.limit.is_none()
    }
}
