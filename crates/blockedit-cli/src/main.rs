use anyhow::{Context, Result, anyhow, bail};
use blockedit_config::Config;
use blockedit_engine::{BlockPatch, Cmd, Editor, Point, Selection};
use std::{env, io::Read, path::PathBuf, process};

/// One line of an editing script
#[derive(Debug, PartialEq)]
enum Step {
    Command(Cmd),
    Undo,
    Redo,
}

fn parse_offset(word: Option<&str>) -> Result<usize> {
    let word = word.ok_or_else(|| anyhow!("missing offset"))?;
    word.parse()
        .with_context(|| format!("invalid offset '{word}'"))
}

fn parse_selection(args: &str) -> Result<Selection> {
    let mut words = args.split_whitespace();
    let anchor_block = words.next().ok_or_else(|| anyhow!("missing block id"))?;
    let anchor = Point::new(anchor_block, parse_offset(words.next())?);

    let focus = match words.next() {
        Some(focus_block) => Point::new(focus_block, parse_offset(words.next())?),
        None => anchor.clone(),
    };
    if words.next().is_some() {
        bail!("too many arguments to select");
    }
    Ok(Selection::new(anchor, focus))
}

fn required<'a>(args: &'a str, what: &str) -> Result<&'a str> {
    if args.is_empty() {
        bail!("missing {what}");
    }
    Ok(args)
}

/// Parse a script line; blank lines and `#` comments yield `None`
fn parse_line(line: &str) -> Result<Option<Step>> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() || line.trim_start().starts_with('#') {
        return Ok(None);
    }

    let line = line.trim_start();
    let (word, args) = line.split_once(' ').unwrap_or((line, ""));

    let cmd = match word {
        "undo" => return Ok(Some(Step::Undo)),
        "redo" => return Ok(Some(Step::Redo)),
        "insert" => Cmd::InsertText(required(args, "text")?.to_string()),
        "backspace" => Cmd::DeleteBackward,
        "delete" => Cmd::DeleteForward,
        "newline" => Cmd::AddNewLine,
        "newline-before" => Cmd::AddNewLineBefore,
        "select" => Cmd::SetSelection(parse_selection(args)?),
        "select-all" => Cmd::SelectAll,
        "delete-selection" => Cmd::DeleteSelected,
        "apply" => {
            let args = required(args.trim(), "style label")?;
            let (style, meta) = args.split_once(' ').unwrap_or((args, ""));
            let meta = match meta.trim() {
                "" => None,
                json => Some(
                    serde_json::from_str(json)
                        .with_context(|| format!("invalid style metadata '{json}'"))?,
                ),
            };
            Cmd::ApplyStyle {
                style: style.to_string(),
                meta,
            }
        }
        "remove" => Cmd::RemoveStyle {
            style: required(args.trim(), "style label")?.to_string(),
        },
        "toggle" => Cmd::ToggleStyle {
            style: required(args.trim(), "style label")?.to_string(),
        },
        "type" => match required(args.trim(), "block type")? {
            "-" => Cmd::SetBlockType(None),
            tag => Cmd::SetBlockType(Some(tag.to_string())),
        },
        "remove-block" => Cmd::RemoveCurrentBlock,
        "embed" => Cmd::InsertBlock(BlockPatch::atomic(required(args.trim(), "block type")?)),
        "paste" => Cmd::PasteText(required(args, "text")?.replace("\\n", "\n")),
        other => bail!("unknown command '{other}'"),
    };
    Ok(Some(Step::Command(cmd)))
}

fn run_script(editor: &mut Editor, script: &str) -> Result<()> {
    for (number, line) in script.lines().enumerate() {
        let step = parse_line(line).with_context(|| format!("line {}", number + 1))?;
        match step {
            Some(Step::Command(cmd)) => {
                let patch = editor.apply(cmd);
                log::debug!(
                    "line {}: changed={} version={}",
                    number + 1,
                    patch.changed,
                    patch.version
                );
            }
            Some(Step::Undo) => {
                if !editor.undo() {
                    log::info!("line {}: nothing to undo", number + 1);
                }
            }
            Some(Step::Redo) => {
                if !editor.redo() {
                    log::info!("line {}: nothing to redo", number + 1);
                }
            }
            None => {}
        }
    }
    Ok(())
}

fn read_script(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display())),
        None => {
            let mut script = String::new();
            std::io::stdin()
                .read_to_string(&mut script)
                .context("Failed to read script from stdin")?;
            Ok(script)
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let args: Vec<String> = env::args().collect();
    let script_path = match args.len() {
        1 => None,
        2 => Some(PathBuf::from(&args[1])),
        _ => {
            eprintln!("Usage: {} [script]", args[0]);
            process::exit(1);
        }
    };

    let config = match Config::load() {
        Ok(Some(config)) => {
            log::info!("Loaded config from {}", Config::config_path().display());
            config
        }
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let script = read_script(script_path.as_ref())?;
    let mut editor = Editor::with_config(&config);
    run_script(&mut editor, &script)?;

    println!("{}", serde_json::to_string_pretty(&editor.snapshot())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn texts(editor: &Editor) -> Vec<&str> {
        editor.blocks().iter().map(|b| b.text.as_str()).collect()
    }

    #[test]
    fn test_parse_keeps_text_spacing() {
        assert_eq!(
            parse_line("insert  two spaces").unwrap(),
            Some(Step::Command(Cmd::InsertText(" two spaces".to_string())))
        );
    }

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(parse_line("# setup").unwrap(), None);
    }

    #[test]
    fn test_parse_select() {
        assert_eq!(
            parse_line("select 1 2 3 4").unwrap(),
            Some(Step::Command(Cmd::SetSelection(Selection::new(
                Point::new("1", 2),
                Point::new("3", 4)
            ))))
        );
        assert_eq!(
            parse_line("select 1 2").unwrap(),
            Some(Step::Command(Cmd::SetSelection(Selection::caret("1", 2))))
        );
        assert!(parse_line("select 1 x").is_err());
    }

    #[test]
    fn test_parse_apply_with_meta() {
        assert_eq!(
            parse_line(r#"apply link {"href": "https://example.com"}"#).unwrap(),
            Some(Step::Command(Cmd::ApplyStyle {
                style: "link".to_string(),
                meta: Some(json!({ "href": "https://example.com" })),
            }))
        );
    }

    #[test]
    fn test_parse_block_type() {
        assert_eq!(
            parse_line("type -").unwrap(),
            Some(Step::Command(Cmd::SetBlockType(None)))
        );
        assert_eq!(
            parse_line("type heading").unwrap(),
            Some(Step::Command(Cmd::SetBlockType(Some("heading".to_string()))))
        );
    }

    #[test]
    fn test_unknown_command_names_line() {
        let mut editor = Editor::new();
        let err = run_script(&mut editor, "insert a\n\nfrobnicate\n").unwrap_err();
        assert_eq!(format!("{err:#}"), "line 3: unknown command 'frobnicate'");
    }

    #[test]
    fn test_run_script() {
        let script = "\
# type two paragraphs
insert Hello
newline
insert world
select 1 0 1 5
apply bold
undo
redo
select 1 0 1 5
paste !\\nbye
";
        let mut editor = Editor::new();
        run_script(&mut editor, script).unwrap();

        assert_eq!(texts(&editor), vec!["!", "bye", "world"]);
        assert!(editor.blocks()[0].styles.is_empty());
    }
}
