mod test_candidate_never_echoed;
mod test_malformed_message_is_isolated;
