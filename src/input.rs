use crate::{
    report::Report,
    section::{Node, Section, is_reserved_key},
};
use tracing::warn;

impl Report {
    /// Adds (or resets) input source `name` on the active step.
    pub fn add_input_source(&mut self, name: &str) -> Option<&mut Section> {
        if is_reserved_key(name) {
            warn!("cannot add input source {name}: name is reserved");
            return None;
        }
        let step = self.active_step_mut()?;
        Some(add_input_source_to(step, name))
    }

    /// Records an input file read by the active step. Attributes are copied
    /// verbatim; unlike output files there is no completeness check.
    pub fn add_input_file<I, K, V>(&mut self, source: &str, attrs: I) -> Option<&mut Section>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Node>,
    {
        if is_reserved_key(source) {
            warn!("cannot add input file to source {source}: name is reserved");
            return None;
        }
        let step = self.active_step_mut()?;
        let has_source = step
            .section("input")
            .is_some_and(|input| input.section(source).is_some());
        if !has_source {
            add_input_source_to(step, source);
        }

        let files = step
            .ensure_section("input")
            .ensure_section(source)
            .ensure_section("files");
        let count = files.bump("fileCount");
        let file_ref = files.create_section(&format!("file{count}"));
        for (k, v) in attrs {
            let k: String = k.into();
            if is_reserved_key(&k) {
                warn!("ignoring input attribute {k} from {source}: name is reserved");
                continue;
            }
            file_ref.set(k, v);
        }
        file_ref.create_section("runs");
        file_ref.create_section("branches");
        Some(file_ref)
    }
}

fn add_input_source_to<'a>(step: &'a mut Section, name: &str) -> &'a mut Section {
    let source = step.ensure_section("input").create_section(name);
    source.create_section("files").set("fileCount", 0i64);
    source.create_section("dataset");
    source
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lazily_creates_source() {
        let mut report = Report::with_step("cmsRun1");
        let file = report
            .add_input_file("source", [("lfn", Node::from("/store/in.root")), ("events", 5u64.into())])
            .unwrap();
        assert_eq!(file.string("lfn"), Some("/store/in.root"));
        assert!(file.section("runs").unwrap().is_empty());

        let step = report.retrieve_step("cmsRun1").unwrap();
        let source = step.section("input").unwrap().section("source").unwrap();
        assert_eq!(source.section("files").unwrap().int("fileCount"), Some(1));
        assert!(source.section("dataset").unwrap().is_empty());
    }
}
