//! GraphQL query documents sent to the content API.
//!
//! Each constant is a complete query; variables are supplied per call through
//! [`ContentQuery`](crate::content::ContentQuery).

pub const EVENT_LIST_QUERY: &str = r#"
  query EventList($limit: Int!) {
    eventCollection(order: yearIdentifier_DESC, limit: $limit) {
      items {
        sys { id }
        name
        yearIdentifier
      }
    }
  }
"#;

pub const EVENT_BY_YEAR_QUERY: &str = r#"
  query EventByYear($year: Int!) {
    eventCollection(where: { yearIdentifier: $year }, limit: 1) {
      items {
        sys { id }
        name
        yearIdentifier
        description
        startTime
        endTime
        location
        ticketSaleLink
        image { url description }
        teamPhoto { url description }
        speakersCollection(limit: 48) {
          items {
            __typename
            ... on Speaker { name jobTitle linkedInProfileLink photo { url description } }
            ... on Host { name linkedin photo { url description } }
            ... on Performer { name title photo { url description } }
            ... on NewTeamMemberCard { firstName lastName positionTitle }
          }
        }
        hostsCollection(limit: 24) {
          items {
            __typename
            ... on Host { name linkedin photo { url description } }
            ... on Speaker { name jobTitle linkedInProfileLink photo { url description } }
            ... on Performer { name title photo { url description } }
            ... on NewTeamMemberCard { firstName lastName positionTitle }
          }
        }
        performersCollection(limit: 24) {
          items {
            __typename
            ... on Performer { name title photo { url description } }
            ... on Speaker { name jobTitle linkedInProfileLink photo { url description } }
            ... on NewTeamMemberCard { firstName lastName positionTitle }
          }
        }
        teamsCollection(limit: 12) {
          items {
            __typename
            ... on Team {
              name
              teamMembersCollection(limit: 60) {
                items {
                  __typename
                  ... on NewTeamMemberCard {
                    firstName
                    lastName
                    positionTitle
                    team
                    isLead
                    linkedInUrl
                    portrait { url description }
                  }
                  ... on TeamMember { name title photo { url description } }
                }
              }
            }
          }
        }
      }
    }
  }
"#;

pub const TEAM_BY_YEAR_QUERY: &str = r#"
  query TeamByYear($year: Int!, $limit: Int!) {
    newTeamMemberCardCollection(
      where: { year: $year }
      order: [team_ASC, isLead_DESC, positionTitle_ASC, lastName_ASC, firstName_ASC]
      limit: $limit
    ) {
      items {
        firstName
        lastName
        positionTitle
        team
        year
        isLead
        linkedInUrl
        portrait { url description }
      }
    }
  }
"#;

pub const STATIC_IMAGES_BY_CODE_QUERY: &str = r#"
  query StaticImagesByCode($codes: [String!], $limit: Int!) {
    imageStaticCollection(where: { code_in: $codes }, limit: $limit) {
      items {
        code
        altDiscription
        file { url description }
      }
    }
  }
"#;

pub const EMBEDDED_VIDEOS_QUERY: &str = r#"
  query EmbeddedVideos($limit: Int!) {
    newEmbeddedVideoCollection(order: eventYear_DESC, limit: $limit) {
      items {
        sys { id }
        videoTitle
        eventYear
        safeEmbeddingCode { json }
      }
    }
  }
"#;
