use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use seal_sdk::{
    BatchReport, CancellationToken, ChainPolicy, CommitProposal, Seal, SigningIdentity,
    TrustStore, Verdict, Verification,
};
use serde_json::json;

use crate::cli::*;

/// Run one command. `Ok(false)` means the command ran but found a problem
/// worth a non-zero exit (an object that did not verify).
pub fn run_command(cli: Cli, cancel: &CancellationToken) -> anyhow::Result<bool> {
    let format = cli.format;
    match cli.command {
        Command::Init(args) => cmd_init(&cli.repo, args, format),
        Command::Commit(args) => cmd_commit(&open(&cli.repo)?, args, format),
        Command::Log(args) => cmd_log(&open(&cli.repo)?, args, format),
        Command::Sign(args) => cmd_sign(&open(&cli.repo)?, args, format),
        Command::Verify(args) => cmd_verify(open(&cli.repo)?, args, format, cancel),
        Command::List(_) => cmd_list(&open(&cli.repo)?, format),
        Command::Config(args) => cmd_config(open(&cli.repo)?, args, format),
    }
}

fn open(path: &Path) -> anyhow::Result<Seal> {
    Seal::open(path).with_context(|| format!("cannot open repository at {}", path.display()))
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_init(repo: &Path, args: InitArgs, format: OutputFormat) -> anyhow::Result<bool> {
    let path = args.path.unwrap_or_else(|| repo.to_path_buf());
    fs::create_dir_all(&path)?;
    let seal = Seal::init(&path)?;
    match format {
        OutputFormat::Json => print_json(&json!({
            "path": path.display().to_string(),
            "namespace": seal.namespace().name(),
        }))?,
        OutputFormat::Text => {
            println!(
                "{} Initialized Seal repository in {}",
                "✓".green().bold(),
                path.display().to_string().bold()
            );
            println!("  Branch: {}", "main".yellow());
            println!("  Signatures: {}", seal.namespace().canonical_ref().cyan());
        }
    }
    Ok(true)
}

fn cmd_commit(seal: &Seal, args: CommitArgs, format: OutputFormat) -> anyhow::Result<bool> {
    let mut proposal = CommitProposal::new(args.message);
    if let Some(name) = args.author_name {
        let email = args.author_email.unwrap_or_else(|| proposal.author_email.clone());
        proposal = proposal.with_author(name, email);
    } else if let Some(email) = args.author_email {
        let name = proposal.author_name.clone();
        proposal = proposal.with_author(name, email);
    }
    for path in &args.files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("not a file name: {}", path.display()))?
            .to_string();
        let content = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
        proposal = proposal.with_file(name, content);
    }

    let result = seal.commit(proposal)?;
    match format {
        OutputFormat::Json => print_json(&json!({
            "id": result.id.to_hex(),
            "tree": result.tree.to_hex(),
            "parents": result.parents.iter().map(|p| p.to_hex()).collect::<Vec<_>>(),
            "ref": result.updated_ref,
        }))?,
        OutputFormat::Text => {
            println!("{} Committed {}", "✓".green().bold(), result.id.short_hex().yellow());
            println!("  Ref: {}", result.updated_ref.green());
        }
    }
    Ok(true)
}

fn cmd_log(seal: &Seal, args: LogArgs, format: OutputFormat) -> anyhow::Result<bool> {
    let entries = seal.log(args.limit)?;
    if format == OutputFormat::Json {
        print_json(&serde_json::to_value(&entries)?)?;
        return Ok(true);
    }
    if entries.is_empty() {
        println!("No commits yet.");
    }
    for entry in &entries {
        let short = &entry.id[..entry.id.len().min(12)];
        let mark = if entry.signed { "S".green() } else { "-".dimmed() };
        if args.oneline {
            println!("{} {} {}", mark, short.yellow(), entry.summary);
        } else {
            println!("{} {}", "commit".yellow(), entry.id.yellow().bold());
            println!("Author: {}", entry.author);
            if let Some(time) = entry.datetime() {
                println!("Date:   {}", time.format("%a %b %e %H:%M:%S %Y %z"));
            }
            if entry.signed {
                println!("Signed: {}", "yes".green());
            }
            println!("\n    {}\n", entry.summary);
        }
    }
    Ok(true)
}

fn cmd_sign(seal: &Seal, args: SignArgs, format: OutputFormat) -> anyhow::Result<bool> {
    let result = match (&args.key, &args.cert) {
        (Some(key), Some(cert)) => {
            let identity = SigningIdentity::from_pem_files(key, cert)?;
            seal.sign(&args.reference, &identity)?
        }
        (Some(_), None) => bail!("--key was given without --cert"),
        (None, Some(_)) => bail!("--cert was given without --key"),
        (None, None) => seal
            .sign_with_config(&args.reference)
            .context("no signing identity; pass --key/--cert or set signing.key and signing.certificate")?,
    };

    let signer = result.container.signer_subject();
    match format {
        OutputFormat::Json => print_json(&json!({
            "target": result.target.to_hex(),
            "signature": result.blob.to_hex(),
            "digest": result.container.digest().to_hex(),
            "signer": signer,
            "algorithm": result.container.algorithm().name(),
            "replaced": result.replaced.map(|id| id.to_hex()),
        }))?,
        OutputFormat::Text => {
            println!("{} Signed {}", "✓".green().bold(), result.target.short_hex().yellow());
            println!("  Signer: {}", signer.cyan());
            println!("  Digest: {}", result.container.digest().to_hex().dimmed());
            if let Some(previous) = result.replaced {
                println!("  Replaced signature {}", previous.short_hex().dimmed());
            }
        }
    }
    Ok(true)
}

fn cmd_verify(
    mut seal: Seal,
    args: VerifyArgs,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> anyhow::Result<bool> {
    if args.skip_signer_verification {
        seal.set_chain_policy(ChainPolicy::SkipSignerVerification);
    }
    let trust = if args.ca.is_empty() {
        seal.trust_store()?
    } else {
        TrustStore::from_pem_files(&args.ca)?
    };
    if trust.is_empty() && !args.skip_signer_verification {
        tracing::warn!("no trust anchors configured; no signer will be trusted");
    }

    if args.all {
        let report = seal.verify_all(&trust, cancel)?;
        print_report(&report, format)?;
        return Ok(report.all_valid());
    }

    let verification = seal.verify_detailed(&args.reference, &trust)?;
    match format {
        OutputFormat::Json => print_json(&verification_json(&verification))?,
        OutputFormat::Text => print_verification(&verification),
    }
    Ok(verification.verdict.is_valid())
}

fn verification_json(v: &Verification) -> serde_json::Value {
    json!({
        "target": v.target.to_hex(),
        "verdict": v.verdict,
        "signer": v.signer,
        "digest": v.digest.as_ref().map(|d| d.to_hex()),
    })
}

fn verdict_label(verdict: Verdict) -> colored::ColoredString {
    match verdict {
        Verdict::Valid => verdict.as_str().green().bold(),
        Verdict::NoSignature => verdict.as_str().dimmed(),
        _ => verdict.as_str().red().bold(),
    }
}

fn print_verification(v: &Verification) {
    let mark = if v.verdict.is_valid() { "✓".green().bold() } else { "✗".red().bold() };
    println!("{} {} {}", mark, v.target.short_hex().yellow(), verdict_label(v.verdict));
    if let Some(signer) = &v.signer {
        println!("  Signer: {}", signer.cyan());
    }
}

fn print_report(report: &BatchReport, format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        let summary: serde_json::Map<String, serde_json::Value> = report
            .summary()
            .into_iter()
            .map(|(verdict, n)| (verdict.as_str().to_string(), json!(n)))
            .collect();
        return print_json(&json!({
            "requested": report.requested,
            "cancelled": report.cancelled,
            "results": report.verified.iter().map(verification_json).collect::<Vec<_>>(),
            "errors": report.failed.iter().map(|(id, e)| json!({
                "target": id.to_hex(),
                "error": e.to_string(),
            })).collect::<Vec<_>>(),
            "summary": summary,
        }));
    }

    for v in &report.verified {
        print_verification(v);
    }
    for (id, e) in &report.failed {
        println!("{} {} {}", "✗".red().bold(), id.short_hex().yellow(), e.to_string().red());
    }
    println!();
    for (verdict, n) in report.summary() {
        println!("  {:>4} {}", n, verdict_label(verdict));
    }
    if !report.failed.is_empty() {
        println!("  {:>4} {}", report.failed.len(), "error".red());
    }
    if report.cancelled {
        println!(
            "{} Cancelled after {} of {} objects",
            "!".yellow().bold(),
            report.verified.len() + report.failed.len(),
            report.requested
        );
    }
    Ok(())
}

fn cmd_list(seal: &Seal, format: OutputFormat) -> anyhow::Result<bool> {
    let entries = seal.list_signed()?;
    match format {
        OutputFormat::Json => print_json(&json!(entries
            .iter()
            .map(|e| json!({ "target": e.target.to_hex(), "signature": e.blob.to_hex() }))
            .collect::<Vec<_>>()))?,
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No signed objects in {}.", seal.namespace().canonical_ref());
            }
            for entry in &entries {
                println!("{} {}", entry.target.to_hex().yellow(), entry.blob.short_hex().dimmed());
            }
        }
    }
    Ok(true)
}

fn cmd_config(mut seal: Seal, args: ConfigArgs, format: OutputFormat) -> anyhow::Result<bool> {
    let mut config = seal.config().clone();

    match (args.key, args.value) {
        (Some(key), Some(value)) => {
            config.set(&key, &value)?;
            seal.set_config(config)?;
            if format == OutputFormat::Text {
                println!("{} {} = {}", "✓".green(), key.bold(), value);
            }
        }
        (Some(key), None) if args.unset => {
            config.unset(&key)?;
            seal.set_config(config)?;
            if format == OutputFormat::Text {
                println!("{} unset {}", "✓".green(), key.bold());
            }
        }
        (Some(key), None) => {
            let value = config.get(&key)?;
            match format {
                OutputFormat::Json => {
                    let mut map = serde_json::Map::new();
                    map.insert(key, json!(value));
                    print_json(&serde_json::Value::Object(map))?;
                }
                OutputFormat::Text => match value {
                    Some(value) => println!("{value}"),
                    None => return Ok(false),
                },
            }
        }
        (None, _) => {
            let entries = config.entries()?;
            match format {
                OutputFormat::Json => {
                    let map: serde_json::Map<String, serde_json::Value> = entries
                        .into_iter()
                        .map(|(k, v)| (k.to_string(), json!(v)))
                        .collect();
                    print_json(&serde_json::Value::Object(map))?;
                }
                OutputFormat::Text => {
                    for (key, value) in entries {
                        println!("{} = {}", key.bold(), value);
                    }
                }
            }
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;
    use seal_crypto::test_support::{self_signed_identity, TestAuthority};

    use super::*;

    fn run(repo: &Path, args: &[&str]) -> anyhow::Result<bool> {
        let mut argv = vec!["seal", "--repo"];
        let repo = repo.to_str().unwrap().to_string();
        argv.push(&repo);
        argv.extend_from_slice(args);
        run_command(Cli::try_parse_from(argv)?, &CancellationToken::new())
    }

    struct Pems {
        key: PathBuf,
        cert: PathBuf,
        ca: PathBuf,
    }

    fn write_pems(dir: &Path, authority: &TestAuthority) -> Pems {
        let (key, cert) = authority.issue_pem("cli signer");
        let pems = Pems {
            key: dir.join("key.pem"),
            cert: dir.join("cert.pem"),
            ca: dir.join("ca.pem"),
        };
        fs::write(&pems.key, key).unwrap();
        fs::write(&pems.cert, cert).unwrap();
        fs::write(&pems.ca, authority.certificate().to_pem().unwrap()).unwrap();
        pems
    }

    #[test]
    fn init_commit_sign_verify() {
        let dir = tempfile::tempdir().unwrap();
        let keys = tempfile::tempdir().unwrap();
        let pems = write_pems(keys.path(), &TestAuthority::new("cli ca"));
        let repo = dir.path();

        assert!(run(repo, &["init"]).unwrap());
        assert!(run(repo, &["commit", "-m", "first"]).unwrap());
        // Unsigned: runs, but does not pass.
        assert!(!run(repo, &["verify", "--ca", pems.ca.to_str().unwrap()]).unwrap());

        assert!(run(
            repo,
            &["sign", "--key", pems.key.to_str().unwrap(), "--cert", pems.cert.to_str().unwrap()],
        )
        .unwrap());
        assert!(run(repo, &["verify", "--ca", pems.ca.to_str().unwrap()]).unwrap());
        assert!(run(repo, &["--format", "json", "list"]).unwrap());

        let seal = Seal::open(repo).unwrap();
        assert_eq!(seal.list_signed().unwrap().len(), 1);
    }

    #[test]
    fn signing_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let keys = tempfile::tempdir().unwrap();
        let pems = write_pems(keys.path(), &TestAuthority::new("cfg ca"));
        let repo = dir.path();

        run(repo, &["init"]).unwrap();
        run(repo, &["commit", "-m", "c"]).unwrap();
        assert!(run(repo, &["sign"]).is_err());

        run(repo, &["config", "signing.key", pems.key.to_str().unwrap()]).unwrap();
        run(repo, &["config", "signing.certificate", pems.cert.to_str().unwrap()]).unwrap();
        run(repo, &["config", "verify.trust_anchors", pems.ca.to_str().unwrap()]).unwrap();
        assert!(run(repo, &["sign"]).unwrap());
        assert!(run(repo, &["verify", "--all"]).unwrap());
    }

    #[test]
    fn half_identity_is_rejected_even_with_config() {
        let dir = tempfile::tempdir().unwrap();
        let keys = tempfile::tempdir().unwrap();
        let pems = write_pems(keys.path(), &TestAuthority::new("cfg ca"));
        let repo = dir.path();

        run(repo, &["init"]).unwrap();
        run(repo, &["commit", "-m", "c"]).unwrap();
        run(repo, &["config", "signing.key", pems.key.to_str().unwrap()]).unwrap();
        run(repo, &["config", "signing.certificate", pems.cert.to_str().unwrap()]).unwrap();

        let seal = Seal::open(repo).unwrap();
        let key_only = SignArgs {
            reference: "HEAD".into(),
            key: Some(pems.key.clone()),
            cert: None,
        };
        let err = cmd_sign(&seal, key_only, OutputFormat::Text).unwrap_err();
        assert!(err.to_string().contains("--cert"));

        let cert_only = SignArgs {
            reference: "HEAD".into(),
            key: None,
            cert: Some(pems.cert.clone()),
        };
        let err = cmd_sign(&seal, cert_only, OutputFormat::Text).unwrap_err();
        assert!(err.to_string().contains("--key"));

        assert!(run(repo, &["sign", "--cert", pems.cert.to_str().unwrap()]).is_err());
        assert!(seal.list_signed().unwrap().is_empty());
    }

    #[test]
    fn untrusted_signer_fails_unless_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let keys = tempfile::tempdir().unwrap();
        let repo = dir.path();
        let pems = write_pems(keys.path(), &TestAuthority::new("real ca"));

        run(repo, &["init"]).unwrap();
        run(repo, &["commit", "-m", "c"]).unwrap();
        let seal = Seal::open(repo).unwrap();
        seal.sign("HEAD", &self_signed_identity("mallory")).unwrap();

        let ca = pems.ca.to_str().unwrap();
        assert!(!run(repo, &["verify", "--ca", ca]).unwrap());
        assert!(run(repo, &["verify", "--ca", ca, "--skip-signer-verification"]).unwrap());
    }

    #[test]
    fn verify_all_reports_unsigned_history() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path();
        run(repo, &["init"]).unwrap();
        run(repo, &["commit", "-m", "one"]).unwrap();
        run(repo, &["commit", "-m", "two"]).unwrap();
        assert!(!run(repo, &["--format", "json", "verify", "--all"]).unwrap());
    }

    #[test]
    fn commit_with_files_and_log() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path();
        let file = repo.join("notes.txt");
        fs::write(&file, b"content").unwrap();

        run(repo, &["init"]).unwrap();
        assert!(run(
            repo,
            &["commit", "-m", "add notes", "--file", file.to_str().unwrap(), "--author-name", "Ada"],
        )
        .unwrap());
        assert!(run(repo, &["log", "--oneline"]).unwrap());

        let log = Seal::open(repo).unwrap().log(10).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].summary, "add notes");
        assert!(log[0].author.starts_with("Ada"));
    }

    #[test]
    fn config_get_set_unset() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path();
        run(repo, &["init"]).unwrap();

        assert!(!run(repo, &["config", "signing.key"]).unwrap());
        run(repo, &["config", "signing.key", "/k.pem"]).unwrap();
        assert_eq!(
            Seal::open(repo).unwrap().config().get("signing.key").unwrap().as_deref(),
            Some("/k.pem")
        );
        run(repo, &["config", "--unset", "signing.key"]).unwrap();
        assert!(Seal::open(repo).unwrap().config().get("signing.key").unwrap().is_none());
        assert!(run(repo, &["config", "--list"]).unwrap());
        assert!(run(repo, &["config", "no.such.key", "x"]).is_err());
    }

    #[test]
    fn commands_need_a_repository() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(dir.path(), &["log"]).is_err());
    }

    #[test]
    fn init_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), &["init"]).unwrap();
        assert!(run(dir.path(), &["init"]).is_err());
    }
}
