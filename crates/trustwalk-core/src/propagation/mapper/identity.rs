use super::VotesMapper;
use crate::propagation::message::VotesDistributionMessage;

/// Passes every vote through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMapper;

impl VotesMapper for IdentityMapper {
    fn map_vote(&self, _source: u64, _dest: u64, vote: u8) -> VotesDistributionMessage {
        VotesDistributionMessage::from_vote(vote)
    }
}
