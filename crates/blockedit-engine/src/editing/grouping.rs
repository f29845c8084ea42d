use crate::editing::Block;

/// A maximal run of consecutive blocks sharing a group tag, or a lone block
#[derive(Debug, PartialEq)]
pub enum Run<'a> {
    Single(&'a Block),
    Group { tag: String, blocks: Vec<&'a Block> },
}

/// Group consecutive blocks by the tag `classify` assigns them.
///
/// Used by renderers to wrap runs of list items in one container. Blocks that
/// classify as `None` stay on their own; a change of tag starts a new group.
pub fn group_runs<'a, F>(blocks: &'a [Block], mut classify: F) -> Vec<Run<'a>>
where
    F: FnMut(&Block) -> Option<String>,
{
    let mut runs: Vec<Run<'a>> = Vec::new();

    for block in blocks {
        let Some(tag) = classify(block) else {
            runs.push(Run::Single(block));
            continue;
        };
        match runs.last_mut() {
            Some(Run::Group {
                tag: current,
                blocks: members,
            }) if *current == tag => members.push(block),
            _ => runs.push(Run::Group {
                tag,
                blocks: vec![block],
            }),
        }
    }

    runs
}
