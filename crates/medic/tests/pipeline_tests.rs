//! End-to-end pipeline tests with fake collaborators

mod common;

use common::{BrokenEmbeddings, FakeLlm, FakeShell, KeywordEmbeddings, TWO_IDEAS};
use medic::brainstorm::ParseStrategy;
use medic::config::Config;
use medic::executor::ExecutionPolicy;
use medic::{DiagnoseRequest, DiagnosticPipeline, HybridRetriever};
use medic_common::{
    Category, DnsStatus, ExecutionStatus, GatewayStatus, Idea, InputKind, ProbeEvidence, SystemInfo,
};
use std::sync::Arc;

const KB: &str = "When DNS resolution fails but ping to an IP works, inspect resolv.conf and the systemd-resolved service status.\n\nIf the wifi radio is soft blocked, rfkill list shows it and rfkill unblock wifi clears the block.";

fn ubuntu() -> SystemInfo {
    SystemInfo {
        platform: "Linux".to_string(),
        distro: Some("Ubuntu 24.04 LTS".to_string()),
        distro_id: Some("ubuntu".to_string()),
        ..Default::default()
    }
}

fn pipeline(llm: Arc<FakeLlm>, shell: Arc<FakeShell>) -> DiagnosticPipeline {
    DiagnosticPipeline::new(Config::default(), llm, shell)
        .with_retriever(HybridRetriever::from_documents([("kb/network.md", KB)]))
        .with_system(ubuntu())
}

#[tokio::test]
async fn test_diagnose_end_to_end() {
    let llm = FakeLlm::replying(TWO_IDEAS);
    let shell = FakeShell::new();
    let pipeline = pipeline(llm.clone(), shell.clone());

    let mut request = DiagnoseRequest::new("My wifi is up but dns failing on every site");
    request.probe = true;
    let report = pipeline.diagnose(&request).await;

    assert_eq!(report.input_type.label, InputKind::FreeText);
    assert_eq!(report.category.label, Category::Network);
    assert_eq!(report.brainstorm.strategy, ParseStrategy::WholeJson);
    assert!(report.brainstorm.llm_error.is_none());

    // Grounding reached the prompt
    assert!(!report.snippets.is_empty());
    assert!(llm.calls()[0].prompt.contains("resolv.conf"));

    // Connectivity went through the shell
    let connectivity = report.connectivity.unwrap();
    assert_eq!(connectivity.dns, DnsStatus::Working);
    assert_eq!(connectivity.gateway, GatewayStatus::Missing);

    // Ranked best first
    assert_eq!(report.ideas.len(), 2);
    assert_eq!(report.ideas[0].idea.hypothesis, "DNS misconfiguration");
    assert!(report.ideas[0].total_score >= report.ideas[1].total_score);

    // Only whitelisted checks were probed
    assert_eq!(report.probed_checks, 2);
    let dns = &report.ideas[0].idea;
    assert!(!dns.evidence.contains_key("cat /etc/resolv.conf"));
    assert_eq!(
        dns.evidence["dig example.com"],
        ProbeEvidence::Output {
            stdout: "out:dig example.com".to_string(),
            stderr: String::new(),
            returncode: 0,
        }
    );
    assert!(report.ideas[1].idea.evidence.contains_key("nmcli dev status"));
    assert_eq!(shell.call_count(), 5);
}

#[tokio::test]
async fn test_diagnose_without_probe_or_connectivity_spawns_nothing() {
    let shell = FakeShell::new();
    let pipeline = pipeline(FakeLlm::replying(TWO_IDEAS), shell.clone());

    let mut request = DiagnoseRequest::new("dns failing");
    request.connectivity = false;
    let report = pipeline.diagnose(&request).await;

    assert!(report.connectivity.is_none());
    assert_eq!(report.probed_checks, 0);
    assert!(report.ideas.iter().all(|j| j.idea.evidence.is_empty()));
    assert_eq!(shell.call_count(), 0);
}

#[tokio::test]
async fn test_request_overrides_config() {
    let llm = FakeLlm::replying(common::ideas_json(6));
    let pipeline = pipeline(llm.clone(), FakeShell::new());

    let mut request = DiagnoseRequest::new("laptop will not boot past the logo");
    request.ideas = Some(2);
    request.creativity = Some(3);
    request.category = Some(Category::Boot);
    request.connectivity = false;
    let report = pipeline.diagnose(&request).await;

    assert_eq!(report.category.label, Category::Boot);
    assert_eq!(report.category.confidence, 1.0);
    assert_eq!(report.ideas.len(), 2);
    assert_eq!(llm.calls()[0].temperature, 1.0);
    // Boot-specific template was chosen
    assert!(llm.calls()[0].prompt.contains("boot and startup specialist"));
}

#[tokio::test]
async fn test_llm_down_still_yields_one_idea() {
    let pipeline = pipeline(FakeLlm::failing("connection refused"), FakeShell::new());
    let mut request = DiagnoseRequest::new("wifi down");
    request.connectivity = false;
    let report = pipeline.diagnose(&request).await;

    assert_eq!(report.ideas.len(), 1);
    assert_eq!(report.ideas[0].idea.hypothesis, "Generic troubleshooting approach");
    assert_eq!(report.brainstorm.strategy, ParseStrategy::Fallback);
    assert!(report.brainstorm.llm_error.is_some());
}

#[tokio::test]
async fn test_embedding_classifier_and_fallback() {
    let vocabulary = Category::ALL.iter().map(|c| c.as_str()).collect();
    let pipeline = pipeline(FakeLlm::replying(TWO_IDEAS), FakeShell::new())
        .with_embeddings(Arc::new(KeywordEmbeddings { vocabulary }));
    let mut request = DiagnoseRequest::new("something about boot, not sure");
    request.connectivity = false;
    let report = pipeline.diagnose(&request).await;
    assert_eq!(report.category.label, Category::Boot);

    let pipeline = pipeline_with_broken_embeddings();
    let mut request = DiagnoseRequest::new("My WiFi keeps disconnecting");
    request.connectivity = false;
    let report = pipeline.diagnose(&request).await;
    assert_eq!(report.category.label, Category::Network);
    assert!(!report.snippets.is_empty());
}

fn pipeline_with_broken_embeddings() -> DiagnosticPipeline {
    pipeline(FakeLlm::replying(TWO_IDEAS), FakeShell::new()).with_embeddings(Arc::new(BrokenEmbeddings))
}

#[tokio::test]
async fn test_execute_respects_policy() {
    let shell = FakeShell::new();
    let pipeline = pipeline(FakeLlm::replying(""), shell.clone());

    let blocked = pipeline
        .execute("rm -rf /", &pipeline.default_policy())
        .await;
    assert!(!blocked.executed);
    assert_eq!(blocked.status, ExecutionStatus::Blocked);
    assert_eq!(shell.call_count(), 0);

    let forced = ExecutionPolicy::default().with_safe_mode(false);
    let ran = pipeline.execute("rm -rf /tmp/scratch", &forced).await;
    assert!(ran.executed);
    assert_eq!(ran.output, "out:rm -rf /tmp/scratch");
    assert_eq!(shell.call_count(), 1);
}

#[tokio::test]
async fn test_probe_ideas_whitelist() {
    let shell = FakeShell::new();
    let pipeline = pipeline(FakeLlm::replying(""), shell.clone());

    let mut ideas = vec![Idea::new("test", "dns", "x").with_checks([
        "nmcli dev status",
        "ip addr",
        "cat /etc/shadow",
    ])];
    let probed = pipeline.probe_ideas(&mut ideas).await;

    assert_eq!(probed, 2);
    let keys: Vec<&String> = ideas[0].evidence.keys().collect();
    assert!(keys.iter().any(|k| k.contains("nmcli dev status") || k.contains("ip addr")));
    assert!(!keys.iter().any(|k| k.contains("/etc/shadow")));
    assert_eq!(shell.commands(), vec!["nmcli dev status", "ip addr"]);
}
