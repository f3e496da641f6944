use bot_utils::{client_utils::rolls::SampleError, SampleReply};

pub(crate) fn sample_message(reply: &SampleReply) -> String {
    let mut header = format!(":question: <@{}>", reply.requester.id);
    if !reply.tag.is_empty() {
        header.push_str(&format!(": *{}*", reply.tag));
    }
    format!(
        "{}\nSample **{}** from *[1..{}]*\n***Result:***\n```{:?}```",
        header, reply.k, reply.n, reply.values
    )
}

pub(crate) fn rejected_message(err: &SampleError) -> String {
    format!("I dun wan it: {}", err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bot_utils::Requester;

    #[test]
    fn test_sample_messages() {
        let reply = SampleReply {
            requester: Requester {
                id: "42".to_string(),
                nick: None,
                name: "kai".to_string(),
            },
            k: 3,
            n: 10,
            tag: "loot".to_string(),
            values: vec![2, 5, 9],
        };
        assert_eq!(
            sample_message(&reply),
            ":question: <@42>: *loot*\nSample **3** from *[1..10]*\n***Result:***\n```[2, 5, 9]```"
        );
        assert_eq!(
            rejected_message(&SampleError::SampleTooLarge),
            "I dun wan it: `k` (sample size) cannot be greater than `N`!"
        );
    }
}
