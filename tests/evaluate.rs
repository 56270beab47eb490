mod common;

use pretty_assertions::assert_eq;
use replaycov::cli::{cmd_evaluate, EvaluateArgs, Style};
use replaycov::store;

fn setup() -> tempfile::TempDir {
    let grep = String::from_utf8(common::GREP_GCOV.to_vec()).unwrap();
    let dfa = String::from_utf8(common::DFA_GCOV.to_vec()).unwrap();
    let summary = String::from_utf8(common::COV_RESULT.to_vec()).unwrap();
    common::write_tree(&[
        ("bench/grep-3.6/obj-gcov2/src/grep.c.gcov", grep.as_str()),
        ("bench/grep-3.6/obj-gcov2/lib/dfa.c.gcov", dfa.as_str()),
        ("replay/step0/cov_result", "Taken at least once:10.00% of 60\n"),
        ("replay/step1/cov_result", summary.as_str()),
    ])
}

fn args(dir: &std::path::Path, src_dir: &str) -> EvaluateArgs {
    let config = dir.join("config.json");
    let gcov_dir = dir.join("bench/grep-3.6/obj-gcov<gcov_num>/src");
    std::fs::write(
        &config,
        serde_json::json!({
            "grep": { "gcov_dir": gcov_dir, "replay_cmd": "klee-replay ./grep " }
        })
        .to_string(),
    )
    .unwrap();

    EvaluateArgs {
        src_dir: src_dir.to_string(),
        gcov_num: 2,
        config,
        tool: None,
        summaries: vec![
            dir.join("replay/step0/cov_result"),
            dir.join("replay/step1/cov_result"),
        ],
        annotation_root: None,
        out: dir.join("out"),
    }
}

#[test]
fn evaluate_writes_all_tables() {
    let dir = setup();
    let args = args(dir.path(), "/klee_out/featmaker_grep_rep1");

    let out = cmd_evaluate(&args, Style::Text).unwrap();
    assert!(out.contains("Annotation files:  2"));
    assert!(out.contains("Total coverage:    44 branches"));

    let out_dir = dir.path().join("out");
    let branches = store::read_branch_table(
        &out_dir.join("grep/branch_visit_count/featmaker_grep_rep1_branch_visit_count.csv"),
    )
    .unwrap();
    assert_eq!(branches.len(), 9);
    assert_eq!(branches[0], ("dfa.c 101 0".to_string(), 3));

    let functions = std::fs::read_to_string(
        out_dir.join("grep/function_coverage/featmaker_grep_rep1_function_coverage.csv"),
    )
    .unwrap();
    assert_eq!(
        functions,
        "Source File,Function,Coverage,Branches Taken,Branches Total\n\
         dfa.c,dfa_lex,80.00,4,5\n\
         grep.c,usable_st_size,100.00,2,2\n\
         grep.c,grepfile,60.00,3,5\n\
         grep.c,unused_helper,0.00,0,0\n"
    );

    let (_, rows) = store::read_results(&out_dir.join("cov_results/featmaker_grep_cov_result.csv"))
        .unwrap();
    assert_eq!(
        rows.iter().map(|r| r.iter().collect::<Vec<_>>()).collect::<Vec<_>>(),
        vec![vec!["featmaker", "grep", "_rep1", "44", "1.00"]]
    );
}

#[test]
fn repetitions_share_results_table() {
    let dir = setup();

    cmd_evaluate(&args(dir.path(), "/klee_out/featmaker_grep_rep1"), Style::Text).unwrap();
    cmd_evaluate(&args(dir.path(), "/klee_out/featmaker_grep_rep2"), Style::Text).unwrap();
    cmd_evaluate(&args(dir.path(), "/klee_out/featmaker_grep_rep1"), Style::Json).unwrap();

    let (_, rows) = store::read_results(
        &dir.path().join("out/cov_results/featmaker_grep_cov_result.csv"),
    )
    .unwrap();
    let reps: Vec<&str> = rows.iter().map(|r| r.get(2).unwrap()).collect();
    assert_eq!(reps, vec!["_rep2", "_rep1"]);
}

#[test]
fn evaluate_json_output() {
    let dir = setup();
    let out = cmd_evaluate(&args(dir.path(), "/klee_out/HOMI_grep"), Style::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["key"]["tool"], "homi");
    assert_eq!(value["total_coverage"], 44);
    assert_eq!(value["samples"][0]["covered"], 6);
    assert_eq!(value["annotation_files"], 2);
}
