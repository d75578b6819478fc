//! Run statistics and the JSON-LD run report.

use serde::Serialize;
use serde_json::{json, Value};

/// Counters for one conversion run. Updated only on the driver task; worker
/// results are folded in as they complete.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    pub found_datasets: u64,
    pub total_studies: u64,
    pub total_assays: u64,
    pub failed_datasets: u64,
    /// Failed identifiers in encounter order.
    pub failed_ids: Vec<String>,
    pub duration_seconds: f64,
}

impl RunStats {
    pub fn record_failure(&mut self, id: impl Into<String>) {
        self.failed_datasets += 1;
        self.failed_ids.push(id.into());
    }

    pub fn succeeded(&self) -> u64 {
        self.found_datasets.saturating_sub(self.failed_datasets)
    }

    /// Render the run report: a PROV activity with Schema.org action status,
    /// VoID entity counts, and the failed identifiers sorted for stable
    /// output. `rdi` attaches a `prov:used` node describing the upstream
    /// infrastructure when both its identifier and URL are configured.
    pub fn to_jsonld(
        &self,
        activity_name: &str,
        instrument_name: &str,
        rdi: Option<(&str, &str)>,
    ) -> Value {
        let mut failed_ids = self.failed_ids.clone();
        failed_ids.sort();

        let status = if self.failed_datasets == 0 {
            "schema:CompletedActionStatus"
        } else {
            "schema:FailedActionStatus"
        };

        let mut report = json!({
            "@context": {
                "schema": "http://schema.org/",
                "prov": "http://www.w3.org/ns/prov#",
                "void": "http://rdfs.org/ns/void#",
                "xsd": "http://www.w3.org/2001/XMLSchema#",
                "duration": {"@id": "schema:duration", "@type": "schema:Duration"},
                "failed_ids": {"@id": "schema:error", "@container": "@set"},
                "status": {"@id": "schema:actionStatus"},
                "found_datasets": {"@id": "void:entities", "@type": "xsd:integer"},
                "total_studies": {"@id": "schema:result", "@type": "xsd:integer"},
                "total_assays": {"@id": "schema:result", "@type": "xsd:integer"},
            },
            "@type": ["prov:Activity", "schema:CreateAction"],
            "schema:name": activity_name,
            "schema:instrument": {
                "@type": "schema:SoftwareApplication",
                "schema:name": instrument_name,
            },
            "status": status,
            "duration": format!("PT{:.2}S", self.duration_seconds),
            "duration_seconds": (self.duration_seconds * 100.0).round() / 100.0,
            "found_datasets": self.found_datasets,
            "total_studies": self.total_studies,
            "total_assays": self.total_assays,
            "failed_datasets": self.failed_datasets,
            "failed_ids": failed_ids,
        });

        if let Some((identifier, url)) = rdi {
            report["prov:used"] = json!({
                "@id": url,
                "@type": "schema:Organization",
                "schema:identifier": identifier,
                "schema:name": format!("Research Data Infrastructure: {identifier}"),
            });
        }

        report
    }
}
